//! Element locators for the onboarding screens

use crate::driver::Selector;

pub const EMAIL_INPUT: &str = "input";
pub const PASSWORD_INPUT: &str = "input[type=\"password\"]";
pub const TEXT_INPUT: &str = "input[type=\"text\"]";
pub const EMPLOYEE_CARD: &str = ".employee-card";
pub const COMING_SOON_CARD: &str = ".employee-card.coming-soon";
pub const AVATAR_IMAGE: &str = "img[src*=\"avatars\"]";
pub const TERMS_LINK: &str = "a[href*=\"terms\"]";

pub fn continue_button() -> Selector {
    Selector::button("Continue")
}

pub fn back_control() -> Selector {
    Selector::AnyOf(vec![Selector::button("Back"), Selector::css(".back-btn")])
}

/// Control that leaves the persona picker
pub fn employee_continue() -> Vec<Selector> {
    vec![
        Selector::css(".employee-continue-fixed button"),
        Selector::button("Meet"),
        Selector::button("Continue"),
    ]
}

/// Control that leaves personalization and opens the conversation
pub fn meet_assistant() -> Vec<Selector> {
    vec![
        Selector::button("Meet your AI"),
        Selector::button("Meet"),
        Selector::css("button.btn-primary"),
    ]
}

/// Trial or paywall gate shown before the first conversation
pub fn activation() -> Vec<Selector> {
    vec![
        Selector::button("Start free trial"),
        Selector::button("Start trial"),
        Selector::button("Activate"),
    ]
}
