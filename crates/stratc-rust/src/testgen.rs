//! Emits the integration test scaffold that runs a generated strategy
//! against synthetic market snapshots inside the engine crate.
//!
//! Discovery strategies get filter and behavior tests because their tick
//! logic is driven entirely by the market table. Token-specific strategies
//! only get an instantiation check; exercising them needs live books for
//! their configured tokens.

use itertools::Itertools;

use stratc_core::meta::{ParamValue, StrategyMetadata};

use crate::params;

/// Parameters whose values the scaffold re-declares so assertions can
/// reference the same thresholds the strategy was compiled with.
const SCAFFOLD_PARAMS: &[&str] = &[
    "MIN_LIQUIDITY",
    "MAX_LIQUIDITY",
    "MIN_PRICE",
    "MAX_PRICE",
    "MIN_SPREAD_PCT",
    "MAX_SPREAD_PCT",
    "MIN_HOURS_TO_EXPIRY",
    "MAX_HOURS_TO_EXPIRY",
    "ORDER_SIZE",
    "SKEW_FACTOR",
    "SPREAD_BPS",
    "MIN_EDGE",
    "MAX_TOKENS",
    "MAX_POSITION",
];

/// Broad behavioral family of a strategy, inferred from its parameters.
/// The family decides which synthetic market qualifies and what signal
/// mix a qualifying market should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Archetype {
    /// Quotes both sides around the mid; a qualifying market yields a
    /// cancel plus a bid and an ask.
    MarketMaking,
    /// Lifts mispriced offers; a qualifying market yields at least one buy.
    LiquidityTaking,
}

impl Archetype {
    pub fn detect(meta: &StrategyMetadata) -> Self {
        if meta.has_parameter("MIN_CERTAINTY") || meta.has_parameter("MAX_CERTAINTY") {
            Archetype::LiquidityTaking
        } else {
            Archetype::MarketMaking
        }
    }

    /// `(bid, ask, hours_to_expiry, liquidity)` of a market every filter
    /// in the family should accept.
    fn qualifying_market(self) -> (&'static str, &'static str, &'static str, &'static str) {
        match self {
            Archetype::MarketMaking => ("0.68", "0.72", "48.0", "50000.0"),
            Archetype::LiquidityTaking => ("0.94", "0.96", "24.0", "1000.0"),
        }
    }
}

pub struct TestGenerator<'a> {
    meta: &'a StrategyMetadata,
    engine_crate: String,
    archetype: Archetype,
}

impl<'a> TestGenerator<'a> {
    pub fn new(meta: &'a StrategyMetadata, engine_crate: &str) -> Self {
        Self {
            meta,
            engine_crate: engine_crate.replace('-', "_"),
            archetype: Archetype::detect(meta),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_test.rs", self.meta.name)
    }

    pub fn generate(&self) -> String {
        if self.meta.is_dynamic_discovery() {
            self.discovery_tests()
        } else {
            self.token_specific_tests()
        }
    }

    /// The shared fixture module the scaffolds import with `mod fixtures;`.
    pub fn fixtures_module(engine_crate: &str) -> String {
        let engine = engine_crate.replace('-', "_");
        format!(
            r#"//! Shared helpers for generated strategy tests.
//! DO NOT EDIT - regenerate with `stratc compile --emit-tests`

use {engine}::position::Position;
use {engine}::strategy::{{Market, OrderBook, PriceLevel, Signal, StrategyContext}};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Builds a context where each entry is
/// `(token_id, best_bid, best_ask, hours_to_expiry, liquidity, position_size)`.
#[allow(dead_code)]
pub fn create_context_with_markets(
    entries: &[(&str, Decimal, Decimal, f64, f64, Decimal)],
) -> StrategyContext {{
    let mut markets = HashMap::new();
    let mut order_books = HashMap::new();
    let mut positions = HashMap::new();
    for (token_id, bid, ask, hours, liquidity, position) in entries {{
        markets.insert(
            token_id.to_string(),
            Market {{
                question: format!("Test market {{token_id}}"),
                outcome: "Yes".to_string(),
                slug: format!("test-market-{{token_id}}"),
                liquidity: Some(*liquidity),
                hours_until_expiry: Some(*hours),
                end_date: Some("2026-12-31T00:00:00Z".to_string()),
            }},
        );
        order_books.insert(
            token_id.to_string(),
            OrderBook {{
                bids: vec![PriceLevel {{
                    price: *bid,
                    size: dec!(1000),
                }}],
                asks: vec![PriceLevel {{
                    price: *ask,
                    size: dec!(1000),
                }}],
            }},
        );
        if !position.is_zero() {{
            positions.insert(
                token_id.to_string(),
                Position {{
                    token_id: token_id.to_string(),
                    size: *position,
                    avg_price: *bid,
                }},
            );
        }}
    }}
    StrategyContext {{
        timestamp: 1_700_000_000,
        markets,
        order_books,
        positions,
        realized_pnl: dec!(0),
        unrealized_pnl: dec!(0),
        usdc_balance: dec!(10000),
    }}
}}

/// Counts `(cancels, buys, sells, holds)` in a signal batch.
#[allow(dead_code)]
pub fn count_signal_types(signals: &[Signal]) -> (usize, usize, usize, usize) {{
    let mut cancels = 0;
    let mut buys = 0;
    let mut sells = 0;
    let mut holds = 0;
    for signal in signals {{
        match signal {{
            Signal::Cancel {{ .. }} => cancels += 1,
            Signal::Buy {{ .. }} => buys += 1,
            Signal::Sell {{ .. }} => sells += 1,
            Signal::Hold => holds += 1,
            _ => {{}}
        }}
    }}
    (cancels, buys, sells, holds)
}}
"#
        )
    }

    fn header(&self) -> String {
        format!(
            "//! Auto-generated integration tests for {}\n//! DO NOT EDIT - regenerate with `stratc compile --emit-tests`\n\n",
            self.meta.name
        )
    }

    fn token_specific_tests(&self) -> String {
        let struct_name = self.meta.struct_name();
        let name = &self.meta.name;
        let engine = &self.engine_crate;
        let mut out = self.header();
        out.push_str(&format!(
            "use {engine}::strategies::{struct_name};\nuse {engine}::strategy::Strategy;\n\n"
        ));
        out.push_str(
            "// Token-specific strategies need live books for their configured\n\
             // tokens; only construction is checked here.\n\n",
        );
        out.push_str(&format!(
            "#[test]\nfn test_strategy_instantiates() {{\n    let strategy = {struct_name}::new();\n    assert_eq!(strategy.id(), \"{name}\");\n    assert!(!strategy.subscriptions().is_empty());\n}}\n"
        ));
        out
    }

    fn discovery_tests(&self) -> String {
        let struct_name = self.meta.struct_name();
        let name = &self.meta.name;
        let engine = &self.engine_crate;
        let mut out = self.header();
        out.push_str("mod fixtures;\n\nuse fixtures::*;\n");
        out.push_str(&format!(
            "use {engine}::strategies::{struct_name};\nuse {engine}::strategy::Strategy;\n"
        ));
        out.push_str("#[allow(unused_imports)]\nuse rust_decimal::Decimal;\n#[allow(unused_imports)]\nuse rust_decimal_macros::dec;\n\n");
        out.push_str(&self.scaffold_constants());

        out.push_str(&format!(
            "#[test]\nfn test_strategy_instantiates() {{\n    let strategy = {struct_name}::new();\n    assert_eq!(strategy.id(), \"{name}\");\n    assert!(strategy.subscriptions().is_empty());\n}}\n\n"
        ));
        out.push_str(&self.no_markets_test());
        out.push_str(&self.filter_tests());
        out.push_str(&self.behavior_tests());
        out.push_str(&self.position_cap_tests());
        out.push_str(&self.multi_market_test());
        // filter_tests and friends leave a trailing blank line
        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    fn scaffold_constants(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.meta.parameters {
            if !SCAFFOLD_PARAMS.contains(&name.as_str()) {
                continue;
            }
            let (ty, literal) = params::param_to_rust(value);
            out.push_str(&format!(
                "#[allow(dead_code)]\nconst {name}: {ty} = {literal};\n"
            ));
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    fn param_f64(&self, name: &str) -> Option<f64> {
        self.meta.parameters.get(name).and_then(ParamValue::as_f64)
    }

    fn param_text(&self, name: &str) -> Option<String> {
        self.meta.parameters.get(name).map(params::plain_literal)
    }

    /// One market that passes every filter, with a single field overridden.
    fn single_market_test(
        &self,
        test_name: &str,
        market: (&str, &str, &str, &str, &str),
        comment: &str,
    ) -> String {
        let struct_name = self.meta.struct_name();
        let (bid, ask, hours, liquidity, position) = market;
        format!(
            "#[test]\nfn {test_name}() {{\n    // {comment}\n    let mut strategy = {struct_name}::new();\n    let markets = vec![(\"token1\", dec!({bid}), dec!({ask}), {hours}, {liquidity}, dec!({position}))];\n    let ctx = create_context_with_markets(&markets);\n    let signals = strategy.on_tick(&ctx);\n    let (_cancels, _buys, _sells, holds) = count_signal_types(&signals);\n    assert_eq!(holds, 1);\n}}\n\n"
        )
    }

    fn no_markets_test(&self) -> String {
        let struct_name = self.meta.struct_name();
        format!(
            "#[test]\nfn test_holds_with_no_markets() {{\n    let mut strategy = {struct_name}::new();\n    let ctx = create_context_with_markets(&[]);\n    let signals = strategy.on_tick(&ctx);\n    let (_cancels, _buys, _sells, holds) = count_signal_types(&signals);\n    assert_eq!(holds, 1);\n}}\n\n"
        )
    }

    fn filter_tests(&self) -> String {
        let (bid, ask, hours, liquidity) = self.archetype.qualifying_market();
        let mut out = String::new();
        if let Some(floor) = self.param_f64("MIN_LIQUIDITY") {
            let thin = params::float_literal(floor / 2.0);
            out.push_str(&self.single_market_test(
                "test_skips_low_liquidity_market",
                (bid, ask, hours, &thin, "0"),
                "liquidity below MIN_LIQUIDITY",
            ));
        }
        if self.meta.has_parameter("MIN_PRICE") {
            out.push_str(&self.single_market_test(
                "test_skips_low_price_market",
                ("0.10", "0.15", hours, liquidity, "0"),
                "price below MIN_PRICE",
            ));
        }
        if self.meta.has_parameter("MAX_PRICE") && self.archetype == Archetype::MarketMaking {
            out.push_str(&self.single_market_test(
                "test_skips_high_price_market",
                ("0.85", "0.90", hours, liquidity, "0"),
                "price above MAX_PRICE",
            ));
        }
        if let Some(min_hours) = self.param_f64("MIN_HOURS_TO_EXPIRY") {
            let soon = params::float_literal(min_hours / 2.0);
            out.push_str(&self.single_market_test(
                "test_skips_near_expiry_market",
                (bid, ask, &soon, liquidity, "0"),
                "expiry closer than MIN_HOURS_TO_EXPIRY",
            ));
        }
        out
    }

    fn behavior_tests(&self) -> String {
        let struct_name = self.meta.struct_name();
        let (bid, ask, hours, liquidity) = self.archetype.qualifying_market();
        match self.archetype {
            Archetype::MarketMaking => format!(
                "#[test]\nfn test_quotes_qualifying_market() {{\n    let mut strategy = {struct_name}::new();\n    let markets = vec![(\"token1\", dec!({bid}), dec!({ask}), {hours}, {liquidity}, dec!(0))];\n    let ctx = create_context_with_markets(&markets);\n    let signals = strategy.on_tick(&ctx);\n    let (cancels, buys, sells, holds) = count_signal_types(&signals);\n    assert_eq!(cancels, 1);\n    assert_eq!(buys, 1);\n    assert_eq!(sells, 1);\n    assert_eq!(holds, 0);\n}}\n\n"
            ),
            Archetype::LiquidityTaking => format!(
                "#[test]\nfn test_takes_qualifying_market() {{\n    let mut strategy = {struct_name}::new();\n    let markets = vec![(\"token1\", dec!({bid}), dec!({ask}), {hours}, {liquidity}, dec!(0))];\n    let ctx = create_context_with_markets(&markets);\n    let signals = strategy.on_tick(&ctx);\n    let (_cancels, buys, _sells, holds) = count_signal_types(&signals);\n    assert!(buys >= 1, \"expected at least one buy, got {{signals:?}}\");\n    assert_eq!(holds, 0);\n}}\n\n"
            ),
        }
    }

    fn position_cap_tests(&self) -> String {
        let Some(cap) = self.param_text("MAX_POSITION") else {
            return String::new();
        };
        if self.archetype != Archetype::MarketMaking {
            return String::new();
        }
        let (bid, ask, hours, liquidity) = self.archetype.qualifying_market();
        let struct_name = self.meta.struct_name();
        let mut out = format!(
            "#[test]\nfn test_stops_buying_at_max_position() {{\n    let mut strategy = {struct_name}::new();\n    let markets = vec![(\"token1\", dec!({bid}), dec!({ask}), {hours}, {liquidity}, dec!({cap}))];\n    let ctx = create_context_with_markets(&markets);\n    let signals = strategy.on_tick(&ctx);\n    let (_cancels, buys, sells, _holds) = count_signal_types(&signals);\n    assert_eq!(buys, 0);\n    assert_eq!(sells, 1);\n}}\n\n"
        );
        out.push_str(&format!(
            "#[test]\nfn test_stops_selling_at_max_short() {{\n    let mut strategy = {struct_name}::new();\n    let markets = vec![(\"token1\", dec!({bid}), dec!({ask}), {hours}, {liquidity}, dec!(-{cap}))];\n    let ctx = create_context_with_markets(&markets);\n    let signals = strategy.on_tick(&ctx);\n    let (_cancels, buys, sells, _holds) = count_signal_types(&signals);\n    assert_eq!(buys, 1);\n    assert_eq!(sells, 0);\n}}\n\n"
        ));
        out
    }

    fn multi_market_test(&self) -> String {
        let struct_name = self.meta.struct_name();
        let (bid, ask, hours, liquidity) = self.archetype.qualifying_market();
        let entries = (1..=3)
            .map(|i| format!("        (\"token{i}\", dec!({bid}), dec!({ask}), {hours}, {liquidity}, dec!(0)),"))
            .join("\n");
        format!(
            "#[test]\nfn test_handles_multiple_markets() {{\n    let mut strategy = {struct_name}::new();\n    let markets = vec![\n{entries}\n    ];\n    let ctx = create_context_with_markets(&markets);\n    let signals = strategy.on_tick(&ctx);\n    assert!(signals.len() >= 3, \"expected a signal per market, got {{signals:?}}\");\n}}\n\n"
        )
    }
}
