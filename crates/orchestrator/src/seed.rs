//! Demo agents for an empty catalog.

use brain_core::{ExampleDialogue, GenerationSettings, PromptConfig};
use tracing::info;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::model::AgentDraft;

struct DemoAgent {
    name: &'static str,
    category: &'static str,
    icon: &'static str,
    price: f64,
    description: &'static str,
    system: &'static str,
    welcome: &'static str,
    example: (&'static str, &'static str),
}

const DEMO_AGENTS: &[DemoAgent] = &[
    DemoAgent {
        name: "Content Writer Pro",
        category: "Content Writing",
        icon: "Pen",
        price: 9.0,
        description: "Long-form articles and blog posts in your brand voice.",
        system: "You are an experienced content writer. Write clear, engaging long-form content.",
        welcome: "Tell me your topic and audience and I'll draft an outline.",
        example: ("Blog post about remote work", "Here's an outline: 1. The new normal..."),
    },
    DemoAgent {
        name: "Social Media Expert",
        category: "Social Media",
        icon: "MessageSquare",
        price: 7.0,
        description: "Posts, threads and captions tuned for each platform.",
        system: "You are a social media strategist. Write short, platform-appropriate posts.",
        welcome: "Which platform are we posting to today?",
        example: ("Launch post for our app", "Big news! Our app is live..."),
    },
    DemoAgent {
        name: "SEO Optimizer",
        category: "SEO",
        icon: "Search",
        price: 8.0,
        description: "Keyword research, meta descriptions and on-page suggestions.",
        system: "You are an SEO specialist. Suggest keywords and concise meta descriptions.",
        welcome: "",
        example: ("Meta description for a bakery", "Fresh bread baked daily in the heart of town."),
    },
    DemoAgent {
        name: "Email Marketing Pro",
        category: "Email Marketing",
        icon: "Mail",
        price: 6.0,
        description: "Subject lines and campaigns that get opened.",
        system: "You are an email marketer. Write subject lines and short campaign emails.",
        welcome: "Share your offer and I'll write the subject line first.",
        example: ("Subject line for a spring sale", "Spring into savings: 20% off everything"),
    },
    DemoAgent {
        name: "Tagline Pro",
        category: "Copywriting",
        icon: "Sparkles",
        price: 5.0,
        description: "Punchy taglines and slogans for products and brands.",
        system: "You are a copywriter who writes memorable taglines.",
        welcome: "What are we naming or selling?",
        example: ("Coffee shop", "Brewed for you."),
    },
];

/// Drafts for the demo agents.
pub fn demo_drafts() -> Vec<AgentDraft> {
    DEMO_AGENTS
        .iter()
        .map(|demo| AgentDraft {
            name: demo.name.to_string(),
            category: demo.category.to_string(),
            description: demo.description.to_string(),
            price: demo.price,
            icon: demo.icon.to_string(),
            prompt: PromptConfig {
                system: demo.system.to_string(),
                welcome: demo.welcome.to_string(),
                examples: vec![ExampleDialogue {
                    user: demo.example.0.to_string(),
                    agent: demo.example.1.to_string(),
                }],
            },
            settings: GenerationSettings::default(),
        })
        .collect()
}

/// Insert the demo agents if the catalog has no agents at all.
///
/// Returns how many agents were created.
pub async fn seed_catalog(catalog: &Catalog) -> Result<usize> {
    if !catalog.all().await?.is_empty() {
        return Ok(0);
    }

    let drafts = demo_drafts();
    for draft in &drafts {
        catalog.create(draft).await?;
    }
    info!("Seeded catalog with {} demo agents", drafts.len());
    Ok(drafts.len())
}
