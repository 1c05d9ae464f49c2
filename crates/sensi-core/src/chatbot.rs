//! Support chatbot for legendary-tier buyers: keyword-routed canned answers.

use crate::assistant::{Conversation, Sender};
use crate::error::{SensiError, SensiResult};

pub const SUPPORT_GREETING: &str = "Hello! I'm your AI Sensitivity Expert. I can help you with setting up your sensitivity configurations, optimizing your gameplay, and answering questions about your purchased sensitivity packs. How can I assist you today?";

/// Answer topics, in routing priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    AndroidSetup,
    PcSetup,
    IosSetup,
    SensitivitySetup,
    OptimizationTips,
    Troubleshooting,
    Default,
}

const ROUTES: &[(Topic, &[&str])] = &[
    (Topic::AndroidSetup, &["android", "mobile"]),
    (Topic::PcSetup, &["pc", "computer"]),
    (Topic::IosSetup, &["ios", "iphone"]),
    (Topic::SensitivitySetup, &["setup", "install", "configure"]),
    (Topic::OptimizationTips, &["optimize", "tips", "improve"]),
    (Topic::Troubleshooting, &["problem", "issue", "help", "trouble"]),
];

impl Topic {
    /// First topic whose keyword appears in the lower-cased message.
    pub fn route(message: &str) -> Topic {
        let lower = message.to_lowercase();
        ROUTES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::Default)
    }

    pub fn answer(self) -> &'static str {
        match self {
            Topic::SensitivitySetup => "To set up your sensitivity, follow these steps:\n1. Download the sensitivity file from your dashboard\n2. Open your game settings\n3. Navigate to sensitivity settings\n4. Import the downloaded configuration\n5. Apply and restart your game for optimal performance.",
            Topic::OptimizationTips => "Here are some pro optimization tips:\n• Adjust your DPI to match the sensitivity settings\n• Ensure your mouse acceleration is disabled\n• Use a consistent framerate (60fps or higher)\n• Practice with the new settings for at least 3-5 games\n• Fine-tune based on your playstyle preferences.",
            Topic::AndroidSetup => "For Android setup:\n1. Download the sensitivity file to your device\n2. Open your mobile game\n3. Go to Settings > Controls > Sensitivity\n4. Import the downloaded configuration\n5. Test in training mode before ranked matches.",
            Topic::PcSetup => "For PC setup:\n1. Download the complete optimization package\n2. Run the installer as administrator\n3. Configure your mouse DPI settings\n4. Apply the sensitivity configuration\n5. Restart your game and test the settings.",
            Topic::IosSetup => "For iOS setup:\n1. Download the sensitivity profile\n2. Open your game settings\n3. Navigate to Controls > Advanced\n4. Import the sensitivity configuration\n5. Calibrate based on your device model.",
            Topic::Troubleshooting => "Common troubleshooting steps:\n• Ensure you're using the correct sensitivity file for your platform\n• Check that your game is updated to the latest version\n• Restart your device after applying settings\n• If issues persist, try recalibrating in training mode\n• Contact support if problems continue.",
            Topic::Default => "I can help you with sensitivity setup, optimization tips, platform-specific configurations (Android, PC, iOS), and troubleshooting. Please ask me about any of these topics, and I'll provide detailed guidance based on your purchased sensitivity packs.",
        }
    }
}

/// Canned answer for a message.
pub fn reply_to(message: &str) -> &'static str {
    Topic::route(message).answer()
}

/// Append the question and its canned answer; gated on legendary access.
pub fn support_chat(
    conversation: &mut Conversation,
    legendary_access: bool,
    message: &str,
) -> SensiResult<Option<String>> {
    if !legendary_access {
        return Err(SensiError::AccessDenied);
    }
    if message.trim().is_empty() {
        return Ok(None);
    }
    conversation.push(Sender::User, message);
    let answer = reply_to(message);
    conversation.push(Sender::Ai, answer);
    Ok(Some(answer.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn android_lag_routes_to_android() {
        assert_eq!(Topic::route("my android keeps lagging"), Topic::AndroidSetup);
        assert!(reply_to("my android keeps lagging").starts_with("For Android setup:"));
    }

    #[test]
    fn priority_order_wins() {
        // "pc" and "help" both present: platform answers come first.
        assert_eq!(Topic::route("Help with my PC"), Topic::PcSetup);
        assert_eq!(Topic::route("how do I install it"), Topic::SensitivitySetup);
        assert_eq!(Topic::route("any tips?"), Topic::OptimizationTips);
        assert_eq!(Topic::route("there is an issue"), Topic::Troubleshooting);
        assert_eq!(Topic::route("hello"), Topic::Default);
    }

    #[test]
    fn chat_requires_legendary() {
        let mut convo = Conversation::with_greeting(SUPPORT_GREETING);
        assert!(matches!(
            support_chat(&mut convo, false, "iphone setup"),
            Err(SensiError::AccessDenied)
        ));
        let answer = support_chat(&mut convo, true, "iphone setup").unwrap().unwrap();
        assert!(answer.starts_with("For iOS setup:"));
        assert_eq!(convo.messages().len(), 3);
        assert_eq!(support_chat(&mut convo, true, "   ").unwrap(), None);
    }
}
