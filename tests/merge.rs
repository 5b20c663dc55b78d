mod common;

use covgate::aggregate::Aggregate;
use covgate::merge::{merge, Granularity, MaxCoverageDedup, MaxHitMerge, MergeStrategy, UnitKey};
use covgate::model::{flatten, CoverageData};
use covgate::parsers::cobertura::CoberturaParser;
use covgate::parsers::Parser;

fn both_projects() -> Vec<CoverageData> {
    vec![
        CoberturaParser.parse(common::PROJECT_A).unwrap(),
        CoberturaParser.parse(common::PROJECT_B).unwrap(),
    ]
}

#[test]
fn assembly_merge_takes_line_wise_max() {
    let records = flatten(&both_projects());
    let units = MaxHitMerge.merge(&records);

    assert_eq!(units.len(), 2);
    assert_eq!(units[0].key, UnitKey::Assembly("App.Core".to_string()));
    assert_eq!(units[0].total(), 5);
    assert_eq!(units[0].covered(), 5); // each project covered different lines
    assert_eq!(units[1].key, UnitKey::Assembly("App.Desktop".to_string()));
    assert_eq!(units[1].total(), 2);
    assert_eq!(units[1].covered(), 1);

    let agg = Aggregate::from_units(&units);
    assert_eq!((agg.covered_lines, agg.total_lines), (6, 7));
    assert_eq!(agg.gate_percent().unwrap(), 85.7);
}

#[test]
fn class_dedup_keeps_best_observation() {
    let records = flatten(&both_projects());
    let units = MaxCoverageDedup.merge(&records);

    let summary: Vec<(String, u64, u64)> = units
        .iter()
        .map(|u| (u.key.to_string(), u.covered(), u.total()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("App.Core::App.Core.Foo".to_string(), 2, 3),
            ("App.Core::App.Core.Paths".to_string(), 1, 2),
            ("App.Desktop::App.Desktop.Window".to_string(), 1, 2),
        ]
    );

    let agg = Aggregate::from_units(&units);
    assert_eq!((agg.covered_lines, agg.total_lines), (4, 7));
}

#[test]
fn policies_disagree_on_the_same_input() {
    let records = flatten(&both_projects());
    let class_level = Aggregate::from_units(&merge(&records, Granularity::Class));
    let assembly_level = Aggregate::from_units(&merge(&records, Granularity::Assembly));

    assert_eq!(class_level.total_lines, assembly_level.total_lines);
    assert!(class_level.covered_lines < assembly_level.covered_lines);
}

#[test]
fn assembly_merge_ignores_report_order() {
    let mut reports = both_projects();
    let forward = merge(&flatten(&reports), Granularity::Assembly);
    reports.reverse();
    let backward = merge(&flatten(&reports), Granularity::Assembly);
    assert_eq!(forward, backward);
}

#[test]
fn merging_a_report_with_itself_changes_nothing() {
    let a = CoberturaParser.parse(common::PROJECT_A).unwrap();
    let once = flatten(std::slice::from_ref(&a));
    let twice = flatten(&[a.clone(), a]);

    for granularity in [Granularity::Class, Granularity::Assembly] {
        assert_eq!(merge(&once, granularity), merge(&twice, granularity));
    }
}
