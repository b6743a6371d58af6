//! What the compiler knows about the engine's tick context objects.
//!
//! Strategy code reaches into order books and market records through a
//! fixed attribute vocabulary. This table records, per attribute, which
//! host object carries it, whether the Rust side exposes it as a method
//! or a struct field, and how its return value behaves. The guard folding
//! pass and the code generator both read from here so the two can never
//! disagree about what is optional.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    OrderBook,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStyle {
    Method,
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    /// `Option<Decimal>` or similar; needs unwrapping before use.
    Optional,
    /// A bare value, usable directly.
    Plain,
    /// An owned string; accesses clone so the host stays borrowed.
    Text,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub host: Host,
    pub style: AccessStyle,
    pub returns: ReturnKind,
    /// Field projected out of the unwrapped value, for accessors that
    /// surface a whole price level rather than a bare number.
    pub projection: Option<&'static str>,
}

impl FieldSpec {
    pub fn is_method(&self) -> bool {
        self.style == AccessStyle::Method
    }

    /// Only optional order book accessors participate in deferred guard
    /// folding. Market options keep their explicit `is_none` checks.
    pub fn foldable(&self) -> bool {
        self.host == Host::OrderBook && self.returns == ReturnKind::Optional
    }
}

pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "best_bid",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Optional,
        projection: Some("price"),
    },
    FieldSpec {
        name: "best_ask",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Optional,
        projection: Some("price"),
    },
    FieldSpec {
        name: "mid_price",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "spread",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "spread_bps",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "imbalance",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "ask_size",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Plain,
        projection: None,
    },
    FieldSpec {
        name: "bid_size",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Plain,
        projection: None,
    },
    FieldSpec {
        name: "bid_depth",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Plain,
        projection: None,
    },
    FieldSpec {
        name: "ask_depth",
        host: Host::OrderBook,
        style: AccessStyle::Method,
        returns: ReturnKind::Plain,
        projection: None,
    },
    FieldSpec {
        name: "end_date",
        host: Host::Market,
        style: AccessStyle::Field,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "hours_until_expiry",
        host: Host::Market,
        style: AccessStyle::Field,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "liquidity",
        host: Host::Market,
        style: AccessStyle::Field,
        returns: ReturnKind::Optional,
        projection: None,
    },
    FieldSpec {
        name: "question",
        host: Host::Market,
        style: AccessStyle::Field,
        returns: ReturnKind::Text,
        projection: None,
    },
    FieldSpec {
        name: "outcome",
        host: Host::Market,
        style: AccessStyle::Field,
        returns: ReturnKind::Text,
        projection: None,
    },
    FieldSpec {
        name: "slug",
        host: Host::Market,
        style: AccessStyle::Field,
        returns: ReturnKind::Text,
        projection: None,
    },
];

pub fn lookup(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_levels_fold_with_projection() {
        let spec = lookup("best_bid").unwrap();
        assert!(spec.foldable());
        assert!(spec.is_method());
        assert_eq!(spec.projection, Some("price"));
    }

    #[test]
    fn test_market_options_do_not_fold() {
        let spec = lookup("end_date").unwrap();
        assert_eq!(spec.returns, ReturnKind::Optional);
        assert!(!spec.foldable());
        assert!(!spec.is_method());
    }

    #[test]
    fn test_plain_and_text_kinds() {
        assert_eq!(lookup("ask_size").unwrap().returns, ReturnKind::Plain);
        assert_eq!(lookup("question").unwrap().returns, ReturnKind::Text);
        assert!(lookup("not_an_attr").is_none());
    }
}
