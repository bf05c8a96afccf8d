//! Built-in scenario table

use super::{CatalogFile, ScenarioEntry, UseCase};
use crate::verify::MatchPolicy;

fn use_case(name: &str, prompt: &str, keywords: &[&str]) -> UseCase {
    UseCase {
        name: name.to_string(),
        prompt: prompt.to_string(),
        expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
        policy: MatchPolicy::Lenient,
    }
}

fn persona(name: &str, description: &str, use_cases: Vec<UseCase>) -> ScenarioEntry {
    ScenarioEntry {
        name: name.to_string(),
        description: description.to_string(),
        use_cases,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(super) fn catalog_file() -> CatalogFile {
    CatalogFile {
        personas: vec![
            persona(
                "Executive Assistant",
                "Versatile generalist for web apps, emails, data workflows and content plans",
                vec![
                    use_case(
                        "Schedule a meeting",
                        "I need to schedule a meeting with my team next Tuesday at 2pm. Can you help?",
                        &["meeting", "schedule", "Tuesday"],
                    ),
                    use_case(
                        "Draft an email",
                        "Draft a professional email to a client named John about project delivery being delayed by one week.",
                        &["John", "delay", "week"],
                    ),
                    use_case(
                        "Summarize data",
                        "I have quarterly sales numbers: Q1 $120k, Q2 $145k, Q3 $98k, Q4 $210k. Summarize the trend and highlight concerns.",
                        &["Q3", "decline", "Q4"],
                    ),
                    use_case(
                        "Create a content plan",
                        "Create a 1-week social media content plan for a B2B SaaS company launching a new feature.",
                        &["Monday", "post", "launch"],
                    ),
                ],
            ),
            persona(
                "Software Developer",
                "AI software engineer that plans, architects and builds applications",
                vec![
                    use_case(
                        "Build a REST API",
                        "I need a simple REST API in Node.js with Express for a todo list app. Can you create it?",
                        &["express", "app", "route"],
                    ),
                    use_case(
                        "Debug code",
                        "This code crashes: `const x = JSON.parse(undefined);` Why, and how do I fix it?",
                        &["undefined", "try", "catch"],
                    ),
                    use_case(
                        "Architecture recommendation",
                        "I'm building a marketplace app for 10k users. What tech stack do you recommend?",
                        &["database", "frontend", "backend"],
                    ),
                    use_case(
                        "Code review",
                        "Review this function: `function add(a,b){return a+b}`. What improvements would you suggest for production use?",
                        &["type", "validation", "error"],
                    ),
                ],
            ),
            persona(
                "QA Engineer",
                "Analyzes code, generates test cases, runs automated tests",
                vec![
                    use_case(
                        "Generate test cases",
                        "Generate test cases for a login form that accepts email and password.",
                        &["valid", "invalid", "empty"],
                    ),
                    use_case(
                        "Write automated test",
                        "Write a Playwright test that checks if google.com loads and has a search input.",
                        &["playwright", "test", "expect"],
                    ),
                    use_case(
                        "Bug report analysis",
                        "Users report the checkout button sometimes doesn't work on mobile Safari. What should I test?",
                        &["Safari", "mobile", "click"],
                    ),
                    use_case(
                        "Test strategy",
                        "We're launching a payment feature next week. What's the testing strategy?",
                        &["regression", "payment", "test"],
                    ),
                ],
            ),
            persona(
                "System Analyst",
                "Specification expert that analyzes codebases and writes detailed specs",
                vec![
                    use_case(
                        "Create a specification",
                        "Write a specification for a user registration feature that supports email and Google OAuth.",
                        &["registration", "OAuth", "email"],
                    ),
                    use_case(
                        "Analyze requirements",
                        "Client wants \"a fast website\". Break this down into measurable technical requirements.",
                        &["load time", "performance", "metric"],
                    ),
                    use_case(
                        "Edge case analysis",
                        "What edge cases should we consider for a file upload feature that accepts images up to 10MB?",
                        &["size", "format", "error"],
                    ),
                    use_case(
                        "Architecture documentation",
                        "Document the architecture for a microservices system with 3 services: auth, orders, and notifications.",
                        &["auth", "orders", "notification"],
                    ),
                ],
            ),
            persona(
                "Sales Development Rep",
                "Prospect research, outreach campaigns and pipeline management",
                vec![
                    use_case(
                        "Research prospects",
                        "Find the ideal customer profile for a B2B project management tool targeting tech startups.",
                        &["startup", "tech", "target"],
                    ),
                    use_case(
                        "Write cold outreach",
                        "Write a cold email to a VP of Engineering at a 50-person startup about our CI/CD tool.",
                        &["CI/CD", "engineering", "team"],
                    ),
                    use_case(
                        "Objection handling",
                        "A prospect says \"we already use Jira, why would we switch?\" How should I respond?",
                        &["Jira", "benefit", "switch"],
                    ),
                    use_case(
                        "Pipeline review",
                        "I have 20 leads, 5 in discovery, 3 in demo stage, 2 in negotiation. What should I prioritize?",
                        &["negotiation", "prioritize", "close"],
                    ),
                ],
            ),
            persona(
                "SEO Manager",
                "Audits, content optimization and keyword tracking",
                vec![
                    use_case(
                        "SEO audit",
                        "What are the most important things to check in an SEO audit for a new e-commerce site?",
                        &["meta", "speed", "content"],
                    ),
                    use_case(
                        "Keyword strategy",
                        "Suggest a keyword strategy for a SaaS tool that does automated invoicing.",
                        &["keyword", "invoicing", "search"],
                    ),
                    use_case(
                        "Content optimization",
                        "I have a blog post titled \"How to Use Our Tool\". How can I optimize it for SEO?",
                        &["title", "keyword", "heading"],
                    ),
                    use_case(
                        "Technical SEO fix",
                        "My site has duplicate content issues across www and non-www versions. How do I fix this?",
                        &["canonical", "redirect", "301"],
                    ),
                ],
            ),
        ],
        coming_soon: strings(&[
            "Copywriter",
            "Social Media Manager",
            "Workflow Engineer",
            "Customer Support Rep",
            "UI/UX Designer",
            "Marketing Manager",
            "Recruiter",
            "Head of Operations",
        ]),
        user_roles: strings(&[
            "Software Engineer",
            "Product Manager",
            "Founder",
            "Marketing Manager",
            "Sales Manager",
            "Designer",
            "Data Analyst",
            "Operations Manager",
        ]),
        assistant_names: strings(&[
            "Atlas", "Nova", "Orion", "Zephyr", "Phoenix", "Jasper", "Felix", "Leo", "Kai", "Axel",
            "Finn", "Oscar",
        ]),
        avatar_prefixes: strings(&["men", "women", "male", "female"]),
    }
}
