//! # kj-generator-template
//!
//! Template-based implementation of `QuestionGenerator`.
//! Picks a prompt template and a topic for the category, fills the
//! placeholder, and waits a little to feel like a model call.

use std::time::Duration;

use async_trait::async_trait;
use kj_core::models::Category;
use kj_core::traits::QuestionGenerator;
use rand::Rng;
use tracing::debug;

const PLACEHOLDER: &str = "{topic}";

pub struct TemplateGenerator {
    min_delay: Duration,
    max_delay: Duration,
}

impl TemplateGenerator {
    /// Each call sleeps for a uniformly random duration in
    /// `[min_delay, max_delay]` before answering.
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay: min_delay.min(max_delay),
            max_delay: max_delay.max(min_delay),
        }
    }

    /// No artificial latency.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Fills a random template for `category` with a random topic.
    pub fn compose<R: Rng + ?Sized>(category: Category, rng: &mut R) -> String {
        let templates = templates(category);
        let topics = topics(category);
        let template = templates[rng.random_range(0..templates.len())];
        let topic = topics[rng.random_range(0..topics.len())];
        template.replacen(PLACEHOLDER, topic, 1)
    }

    fn pick_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rng.random_range(min..=max))
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new(Duration::from_millis(800), Duration::from_millis(1000))
    }
}

#[async_trait]
impl QuestionGenerator for TemplateGenerator {
    async fn generate(&self, category: Category) -> anyhow::Result<String> {
        // ThreadRng is not Send; finish with it before the first await.
        let (question, delay) = {
            let mut rng = rand::rng();
            (Self::compose(category, &mut rng), self.pick_delay(&mut rng))
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        debug!(%category, delay_ms = delay.as_millis() as u64, "generated question");
        Ok(question)
    }
}

fn templates(category: Category) -> &'static [&'static str] {
    match category {
        Category::Politics => &[
            "What role should citizens play in {topic} today?",
            "How should we judge the effect of {topic} on democracy?",
            "What is a realistic way to solve the political problem of {topic}?",
            "Why do politicians disagree so much about {topic}?",
            "Why should the younger generation care more about {topic}?",
            "What long-term changes will {topic} policy bring to our society?",
            "How would you explain the importance of {topic} in international relations?",
            "What would fundamentally fix our chronic {topic} problem?",
            "Why do generations see {topic} so differently?",
        ],
        Category::Development => &[
            "How will {topic} change the future of developers?",
            "What is an efficient way to learn {topic}?",
            "What matters most in a project built on {topic}?",
            "What should a beginner watch out for when learning {topic}?",
            "What does a career roadmap in {topic} look like?",
            "What is the key to designing a {topic} architecture for heavy traffic?",
            "What are common mistakes with {topic}, and how do you avoid them?",
            "Which developer skills do you think AI cannot replace?",
            "What must developers consider to use AI ethically?",
        ],
        Category::Philosophy => &[
            "How has our understanding of {topic} changed over time?",
            "What perspective do we need to grasp the essence of {topic}?",
            "What does {topic} mean in modern society?",
            "How can different philosophical positions on {topic} be reconciled?",
            "How does one person's experience of {topic} affect society as a whole?",
            "How is technology changing the way we see {topic}?",
            "What would ancient philosophers think of {topic} today?",
            "If {topic} were possible, how would the world change?",
            "Why do we take {topic} for granted, and what is its essence?",
            "Could civilization have developed without the concept of {topic}?",
        ],
        Category::Daily => &[
            "What is a realistic way for busy people to practice {topic}?",
            "How does {topic} affect personal happiness and growth?",
            "How do other people manage {topic}?",
            "What is an effective way to reduce stress about {topic}?",
            "What does it take to build healthy {topic} habits?",
            "What makes {topic} hard to keep up in the digital age?",
            "What is the biggest life lesson {topic} has taught you?",
        ],
    }
}

fn topics(category: Category) -> &'static [&'static str] {
    match category {
        Category::Politics => &[
            "voting",
            "policy",
            "leadership",
            "civic participation",
            "political reform",
            "social justice",
            "economic policy",
            "diplomacy",
            "freedom of the press",
            "climate action",
            "regionalism",
            "housing policy",
            "low birth rates",
            "prosecution reform",
        ],
        Category::Development => &[
            "AI",
            "the cloud",
            "security",
            "performance tuning",
            "code review",
            "teamwork",
            "a new framework",
            "databases",
            "microservices",
            "DevOps culture",
            "the arrival of AGI",
            "AI creativity",
            "AI interviewers",
            "AI copyright",
        ],
        Category::Philosophy => &[
            "existence",
            "consciousness",
            "free will",
            "morality",
            "truth",
            "beauty",
            "time",
            "death",
            "the ethics of AI",
            "the conditions of happiness",
            "time travel",
            "invisibility",
            "mind reading",
            "lucid dreaming",
        ],
        Category::Daily => &[
            "time management",
            "relationships",
            "health",
            "hobbies",
            "stress",
            "goal setting",
            "spending",
            "rest",
            "minimalism",
            "mental health",
        ],
    }
}
