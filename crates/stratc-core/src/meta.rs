use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A strategy parameter literal as written in the decorator.
///
/// The closed set keeps code generation total: anything outside it is
/// rejected while the metadata is being extracted, never during emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Decimal(Decimal),
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn is_int(&self) -> bool {
        matches!(self, ParamValue::Int(_))
    }

    /// Numeric view used by the test scaffold generator when it derives
    /// fixture values (for example half the liquidity floor).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Decimal(d) => d.to_f64(),
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Declarative facts about one strategy, extracted from its decorator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyMetadata {
    /// Snake-case strategy name, also the generated module name.
    pub name: String,
    /// Token ids the strategy subscribes to. Empty means the strategy
    /// discovers markets at runtime instead of pinning tokens up front.
    pub subscriptions: Vec<String>,
    pub tick_interval_ms: Option<u64>,
    /// Parameters in declaration order; order is part of the output contract.
    pub parameters: IndexMap<String, ParamValue>,
    /// Strategies that keep state outside the DSL opt out of compilation.
    pub transpilable: bool,
}

impl StrategyMetadata {
    pub fn struct_name(&self) -> String {
        to_pascal_case(&self.name)
    }

    pub fn is_dynamic_discovery(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }
}

/// `dynamic_market_maker` becomes `DynamicMarketMaker`.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect()
}
