/// Stablecoin-domain terms and token symbols. Matching is plain substring containment.
pub const STABLECOIN_KEYWORDS: &[&str] = &[
    "stablecoin",
    "stable coin",
    "peg",
    "depeg",
    "parity",
    "reserve",
    "reserves",
    "redemption",
    "issuer",
    "collateral",
    "attestation",
    "audit",
    "usdc",
    "usdt",
    "dai",
    "frax",
    "crvusd",
    "pyusd",
    "eurc",
    "usd0",
    "usde",
];

/// True if any keyword appears anywhere in the lowercased title + summary.
pub fn is_relevant(title: &str, summary: &str) -> bool {
    matches_any(title, summary, STABLECOIN_KEYWORDS)
}

pub fn matches_any(title: &str, summary: &str, keywords: &[&str]) -> bool {
    let text = format!("{} {}", title, summary).to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}
