//! Property tests for pipeline and engine invariants.
//!
//! Uses proptest to verify:
//! 1. Normalizer output is clean and idempotent
//! 2. Percentage text parsing never panics and scales by 1/100
//! 3. Score is exactly the number of true flags
//! 4. Similarity results respect every active predicate and the ranking

use proptest::prelude::*;
use std::collections::BTreeSet;

use fiilab_core::domain::{Fund, FundTable, ScoredTable};
use fiilab_core::pipeline::{derive_percentages, normalize_label, parse_percentage_text};
use fiilab_core::scoring::{score, ScoringThresholds};
use fiilab_core::similarity::{similar, SimilarityParams};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_label() -> impl Strategy<Value = String> {
    "[A-Za-zÀ-ÿ0-9 %/_.()-]{0,24}"
}

fn arb_metric() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        4 => (0.0..20.0_f64).prop_map(|v| Some((v * 100.0).round() / 100.0)),
    ]
}

fn arb_fund(index: usize) -> impl Strategy<Value = Fund> {
    (
        arb_metric(),
        arb_metric(),
        prop::option::of(0.0..200_000.0_f64),
        arb_metric(),
        prop::option::of(0.0..1e9_f64),
        prop::sample::select(vec!["Shoppings", "Logística", "Papel"]),
    )
        .prop_map(move |(dy, pvp, liq, vac, vm, segment)| Fund {
            segment: Some(segment.to_string()),
            dy_pct: dy,
            p_vp: pvp.map(|p| p / 10.0),
            liquidity: liq,
            vacancy_pct: vac,
            market_value: vm,
            ..Fund::new(format!("F{index:03}11"), 10.0)
        })
}

fn arb_table() -> impl Strategy<Value = FundTable> {
    (1usize..30)
        .prop_flat_map(|n| (0..n).map(arb_fund).collect::<Vec<_>>())
        .prop_map(|funds| {
            FundTable::new(
                funds,
                ["papel", "segmento", "dy_pct", "p_vp", "liquidez", "vacancia_pct"],
            )
        })
}

fn arb_thresholds() -> impl Strategy<Value = ScoringThresholds> {
    (0.0..20.0_f64, 0.0..3.0_f64, 0.0..100_000.0_f64, 0.0..100.0_f64, 0.0..1e9_f64).prop_map(
        |(min_dy, max_pvp, min_liq, max_vac, min_vm)| ScoringThresholds {
            min_dividend_yield: min_dy,
            max_p_vp: max_pvp,
            min_liquidity: min_liq,
            max_vacancy: max_vac,
            min_market_value: min_vm,
        },
    )
}

fn arb_params() -> impl Strategy<Value = SimilarityParams> {
    (0.0..10.0_f64, 0.0..1.0_f64, 0.0..100_000.0_f64, any::<bool>()).prop_map(
        |(yield_tolerance, ratio_tolerance, min_liquidity, same_category)| SimilarityParams {
            yield_tolerance,
            ratio_tolerance,
            min_liquidity,
            same_category,
        },
    )
}

fn scored(table: &FundTable) -> ScoredTable {
    score(table, &ScoringThresholds::advanced())
}

// ── 1. Column Normalizer ─────────────────────────────────────────────

proptest! {
    #[test]
    fn normalized_labels_are_clean(label in arb_label()) {
        let out = normalize_label(&label);
        prop_assert!(!out.contains(' '));
        prop_assert!(!out.contains('%'));
        prop_assert!(!out.contains('/'));
        prop_assert!(!out.chars().any(|c| "áàâãäéèêëíìîïóòôõöúùûüçñ".contains(c)));
        prop_assert!(!out.chars().any(|c| c.is_uppercase()));
    }

    #[test]
    fn normalizer_is_idempotent(label in arb_label()) {
        let once = normalize_label(&label);
        prop_assert_eq!(normalize_label(&once), once);
    }
}

// ── 2. Percentage text ───────────────────────────────────────────────

proptest! {
    #[test]
    fn percentage_text_never_panics(text in "\\PC{0,16}") {
        let _ = parse_percentage_text(Some(&text));
    }

    #[test]
    fn percentage_text_scales_by_hundred(whole in 0u32..1000, cents in 0u32..100) {
        let text = format!("{whole},{cents:02}%");
        let expected = (whole as f64 + cents as f64 / 100.0) / 100.0;
        let parsed = parse_percentage_text(Some(&text)).unwrap();
        prop_assert!((parsed - expected).abs() < 1e-9);
    }

    #[test]
    fn derived_percentages_match_fractions(fraction in prop::option::of(0.0..1.0_f64)) {
        let fund = Fund { dividend_yield: fraction, ..Fund::new("AAAA11", 1.0) };
        let table = derive_percentages(&FundTable::new(vec![fund], ["papel", "cotacao"]));
        let dy_pct = table.funds()[0].dy_pct;
        match fraction {
            None => prop_assert!(dy_pct.is_none()),
            Some(f) => prop_assert!((dy_pct.unwrap() - f * 100.0).abs() <= 0.005 + 1e-9),
        }
    }
}

// ── 3. Scoring ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn score_is_flag_count(table in arb_table(), thresholds in arb_thresholds()) {
        let scored = score(&table, &thresholds);
        prop_assert_eq!(scored.len(), table.len());
        for f in scored.funds() {
            let count = f.flags.as_array().iter().filter(|&&b| b).count() as u8;
            prop_assert_eq!(f.score(), count);
            prop_assert!(f.score() <= 5);
        }
    }

    #[test]
    fn absent_metric_never_passes(table in arb_table(), thresholds in arb_thresholds()) {
        for f in score(&table, &thresholds).funds() {
            if f.fund.dy_pct.is_none() { prop_assert!(!f.flags.dy_ok); }
            if f.fund.p_vp.is_none() { prop_assert!(!f.flags.pvp_ok); }
            if f.fund.liquidity.is_none() { prop_assert!(!f.flags.liquidity_ok); }
            if f.fund.vacancy_pct.is_none() { prop_assert!(!f.flags.vacancy_ok); }
            if f.fund.market_value.is_none() { prop_assert!(!f.flags.size_ok); }
        }
    }
}

// ── 4. Similarity ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn similarity_results_respect_predicates(
        table in arb_table(),
        params in arb_params(),
        pick in any::<prop::sample::Index>(),
    ) {
        let scored = scored(&table);
        let target = scored.funds()[pick.index(scored.len())].fund.clone();
        let result = similar(&scored, &target.ticker, &params).unwrap();

        let t_dy = target.dy_pct.unwrap_or(0.0);
        let t_pvp = target.p_vp.unwrap_or(0.0);

        let mut seen = BTreeSet::new();
        for f in result.funds() {
            prop_assert_ne!(&f.fund.ticker, &target.ticker);
            prop_assert!(seen.insert(f.fund.ticker.clone()));
            prop_assert!((f.fund.dy_pct.unwrap() - t_dy).abs() <= params.yield_tolerance);
            prop_assert!((f.fund.p_vp.unwrap() - t_pvp).abs() <= params.ratio_tolerance);
            prop_assert!(f.fund.liquidity.unwrap() >= params.min_liquidity);
            if params.same_category {
                prop_assert_eq!(&f.fund.segment, &target.segment);
            }
        }

        for pair in result.funds().windows(2) {
            let (a, b) = (&pair[0].fund, &pair[1].fund);
            let da = (a.dy_pct.unwrap() - t_dy).abs();
            let db = (b.dy_pct.unwrap() - t_dy).abs();
            prop_assert!(da <= db);
            if da == db {
                let pa = (a.p_vp.unwrap() - t_pvp).abs();
                let pb = (b.p_vp.unwrap() - t_pvp).abs();
                prop_assert!(pa <= pb);
                if pa == pb {
                    prop_assert!(a.liquidity.unwrap() >= b.liquidity.unwrap());
                }
            }
        }
    }

    #[test]
    fn similarity_with_unknown_target_fails(table in arb_table(), params in arb_params()) {
        prop_assert!(similar(&scored(&table), "ZZZZ99", &params).is_err());
    }
}
