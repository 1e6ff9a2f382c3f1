use crate::config::{LanguageMode, RunSlot};

pub const MASTER_SYSTEM_PROMPT: &str = r#"
You are an AI analyst focused ONLY on stablecoins.

LANGUAGE:
- If LANGUAGE_MODE is 'auto', write in the language that best matches the news brief.
- If LANGUAGE_MODE is 'en' or 'es', write in that language.

SCOPE:
- Discuss ONLY stablecoins (pegs, issuers, reserves, regulation, risks, mechanics).
- NEVER discuss trading or non-stablecoin tokens.

RULES:
- Never give financial advice.
- Never say buy/sell/hold, safe, guaranteed.
- Never predict prices.
- If facts are uncertain, say "reported" or "according to".
- Tone: calm, neutral, analytical.

OUTPUT:
- Write ONE post suitable for X.
- Keep it <= 240 characters when possible.
- Add 1-2 source links at the end (plain URLs).
"#;

const NEWS_TO_X_TEMPLATE: &str = r#"
LANGUAGE_MODE={language_mode}
RUN_SLOT={run_slot}

Write ONE X post about stablecoins based on this news brief.

The post should feel {slot_style}.

Constraints:
- Stablecoins only
- No financial advice
- No price predictions
- Neutral tone
- <= 240 characters when possible
- Include 1-2 source links at the end (URLs)

News brief:
{brief}
"#;

/// Soft length target handed to the model.
pub const TARGET_POST_CHARS: usize = 240;

pub fn slot_style(slot: RunSlot) -> &'static str {
    match slot {
        RunSlot::Morning => {
            "like a morning briefing: crisp, headline-driven, 'what happened + why it matters'"
        }
        RunSlot::Evening => {
            "like an evening wrap-up: reflective, risk-aware, 'what to watch next'"
        }
    }
}

/// Steers morning and evening drafts apart even when both categories are present.
pub fn slot_topic_hint(slot: RunSlot) -> &'static str {
    match slot {
        RunSlot::Morning => "Focus more on regular stablecoin market/news updates.",
        RunSlot::Evening => "Focus more on newly announced/launched stablecoins and what to watch.",
    }
}

/// System instruction followed by the per-run request.
pub fn build_prompt(
    brief: &str,
    language_mode: LanguageMode,
    run_slot: RunSlot,
    slot_style: &str,
) -> String {
    // brief goes last so braces inside news text are never treated as placeholders
    let request = NEWS_TO_X_TEMPLATE
        .replace("{language_mode}", language_mode.as_str())
        .replace("{run_slot}", run_slot.as_str())
        .replace("{slot_style}", slot_style)
        .replace("{brief}", brief);

    format!("{}\n{}", MASTER_SYSTEM_PROMPT, request)
}
