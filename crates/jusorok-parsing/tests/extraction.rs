//! End-to-end tests for the contact extraction pipeline.
//!
//! Every test goes through the public API only: raw text in, a
//! `MultiEntryResult` out.

use jusorok_core::{GazetteerRescorer, NoopRescorer, apply_rescorer};
use jusorok_parsing::address::format_component;
use jusorok_parsing::{
    ContactExtractor, ExtractionConfig, ExtractionConfigBuilder, Field, MultiEntryResult,
    PhoneType, extract, normalize,
};

const SCENARIO_A: &str = "서울특별시 성북구 화랑로 11길 26 103동 1602호 김철수 010-1234-5678";

const SCENARIO_B: &str = "김철수 010-1234-5678
서울특별시 성북구 화랑로 11길 26 103동 1602호

이영희 010-9876-5432
부산광역시 해운대구 해운대로 570 101동 202호";

const SCENARIO_C: &str = "김영수 010-2222-3333 메모 참고 바랍니다";

/// Inputs that exercise odd corners of the pipeline.
const ODD_INPUTS: &[&str] = &[
    "",
    "   \n\t \r\n",
    "0101234",
    "동호층",
    "((,,))",
    "서울",
    "010-1234-5678 010-1234-5678 010-1234-5678",
    "\u{1100}\u{1161}\u{11A8} \u{200B}\u{FEFF}",
    "０１０－１２３４－５６７８ 김철수",
    "A동 B호 지하1층 (우동, ) 서울시",
    "서울특별시 서울특별시 서울특별시 부산광역시",
    "🙂 emoji 김철수님 ☎ 02)123-4567",
];

fn default_extract(raw: &str) -> MultiEntryResult {
    extract(raw, &ExtractionConfig::default())
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_single_complete_entry() {
    let result = default_extract(SCENARIO_A);
    assert_eq!(result.total_entries, 1);

    let entry = &result.entries[0];
    assert_eq!(entry.entry_number, 1);
    assert_eq!(entry.name.as_deref(), Some("김철수"));
    assert_eq!(entry.phone_number.as_deref(), Some("010-1234-5678"));
    assert_eq!(entry.phone_type, Some(PhoneType::Cellphone));

    let address = entry.address.as_ref().expect("address should be present");
    assert_eq!(address.sido.as_deref(), Some("서울특별시"));
    assert_eq!(address.sigungu.as_deref(), Some("성북구"));
    assert_eq!(address.road_name.as_deref(), Some("화랑로 11길"));
    assert_eq!(address.building_number.as_deref(), Some("26"));
    assert!(address.dong.as_deref().is_some_and(|d| d.ends_with('동')));
    assert!(address.ho.as_deref().is_some_and(|h| h.ends_with('호')));
    assert_eq!(
        address.to_formatted_address(),
        "서울특별시 성북구 화랑로 11길 26 103동 1602호"
    );
    assert!(!entry.human_review, "complete entry should pass review");
}

#[test]
fn scenario_b_two_blocks_in_source_order() {
    let result = default_extract(SCENARIO_B);
    assert_eq!(result.total_entries, 2);

    let numbers: Vec<usize> = result.entries.iter().map(|e| e.entry_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(result.entries[0].name.as_deref(), Some("김철수"));
    assert_eq!(result.entries[1].name.as_deref(), Some("이영희"));
    assert_eq!(
        result.entries[1]
            .address
            .as_ref()
            .and_then(|a| a.sido.as_deref()),
        Some("부산광역시")
    );
}

#[test]
fn scenario_b_address_first_layout() {
    let raw = "서울특별시 성북구 화랑로 26 김철수 010-1234-5678 \
               부산광역시 해운대구 해운대로 570 이영희 010-9876-5432";
    let result = default_extract(raw);
    assert_eq!(result.total_entries, 2);
    assert_eq!(result.entries[0].name.as_deref(), Some("김철수"));
    assert_eq!(
        result.entries[1].phone_number.as_deref(),
        Some("010-9876-5432")
    );
}

#[test]
fn scenario_b_single_line_name_first() {
    let raw = "김철수 010-1234-5678 서울특별시 성북구 화랑로 26 \
               이영희 010-9876-5432 부산광역시 해운대구 해운대로 570";
    let result = default_extract(raw);
    assert_eq!(result.total_entries, 2);

    let second = &result.entries[1];
    assert_eq!(result.entries[0].phone_number.as_deref(), Some("010-1234-5678"));
    assert_eq!(second.name.as_deref(), Some("이영희"));
    assert_eq!(second.phone_number.as_deref(), Some("010-9876-5432"));
    assert_eq!(
        second.address.as_ref().and_then(|a| a.sido.as_deref()),
        Some("부산광역시")
    );
}

#[test]
fn stray_syllable_before_phone_keeps_name() {
    let result = default_extract("김철수 집 010-1234-5678 서울특별시 성북구 화랑로 26");
    assert_eq!(result.total_entries, 1);
    assert_eq!(result.entries[0].name.as_deref(), Some("김철수"));
}

#[test]
fn district_glued_to_province() {
    let result = default_extract("서울특별시성북구 화랑로 26 김철수 010-1234-5678");
    let address = result.entries[0].address.as_ref().expect("address");
    assert_eq!(address.sido.as_deref(), Some("서울특별시"));
    assert_eq!(address.sigungu.as_deref(), Some("성북구"));
}

#[test]
fn scenario_c_no_address_tokens() {
    let result = default_extract(SCENARIO_C);
    assert_eq!(result.total_entries, 1);

    let entry = &result.entries[0];
    assert!(entry.address.is_none());
    for field in Field::ADDRESS {
        assert_eq!(entry.field_value(field), None, "{field} should be null");
        assert_eq!(entry.field_confidence(field), 0.0);
    }
    assert_eq!(entry.name.as_deref(), Some("김영수"));
    assert!(entry.human_review);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn totality_over_odd_inputs() {
    let extractor = ContactExtractor::new();
    for raw in ODD_INPUTS {
        let result = extractor.extract(raw);
        assert_eq!(result.total_entries, result.entries.len(), "input {raw:?}");
        if !normalize(raw).is_empty() {
            assert!(result.total_entries >= 1, "input {raw:?}");
        }
        for (i, entry) in result.entries.iter().enumerate() {
            assert_eq!(entry.entry_number, i + 1, "input {raw:?}");
        }
    }
    assert_eq!(extractor.extract("").total_entries, 0);
    assert_eq!(extractor.extract(" \n ").total_entries, 0);
}

#[test]
fn every_field_has_a_confidence() {
    let inputs = ODD_INPUTS
        .iter()
        .copied()
        .chain([SCENARIO_A, SCENARIO_B, SCENARIO_C]);
    for raw in inputs {
        for entry in default_extract(raw).entries {
            assert_eq!(entry.confidence.len(), Field::ALL.len(), "input {raw:?}");
            for field in Field::ALL {
                let c = entry.confidence[field.key()];
                assert!((0.0..=1.0).contains(&c), "{field} = {c} for {raw:?}");
            }
            if let Some(address) = &entry.address {
                assert_eq!(address.confidence.len(), Field::ADDRESS.len());
                assert!(address.resolved_count() > 0);
            }
        }
    }
}

#[test]
fn extraction_is_deterministic() {
    let first = serde_json::to_string(&default_extract(SCENARIO_B)).unwrap();
    let second = serde_json::to_string(&default_extract(SCENARIO_B)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn serial_and_parallel_results_are_identical() {
    let raw = (0..12)
        .map(|i| format!("홍길동 010-1234-{:04}\n서울특별시 강남구 테헤란로 {}", 1000 + i, 100 + i))
        .collect::<Vec<_>>()
        .join("\n");

    let serial = ContactExtractor::with_config(
        ExtractionConfigBuilder::new()
            .parallel_threshold(usize::MAX)
            .build()
            .unwrap(),
    )
    .extract(&raw);
    let parallel = ContactExtractor::with_config(
        ExtractionConfigBuilder::new()
            .parallel_threshold(0)
            .build()
            .unwrap(),
    )
    .extract(&raw);

    assert_eq!(serial.total_entries, 12);
    assert_eq!(
        serde_json::to_string(&serial).unwrap(),
        serde_json::to_string(&parallel).unwrap()
    );
}

#[test]
fn suffix_formatting_is_idempotent() {
    for (field, raw, expected) in [
        (Field::Ho, "305", "305호"),
        (Field::Ho, "305호", "305호"),
        (Field::Dong, "103 동", "103동"),
        (Field::LegalDong, "우동", "우동"),
        (Field::Floor, "5", "5층"),
    ] {
        let once = format_component(field, raw);
        assert_eq!(once, expected);
        assert_eq!(format_component(field, &once), once);
    }
}

#[test]
fn raising_the_threshold_never_unflags() {
    let thresholds = [0.0, 0.25, 0.5, 0.6, 0.75, 0.9, 1.0];
    let raw = format!("{SCENARIO_B}\n{SCENARIO_C}\n서울 강남구 테헤란로 152");
    let mut previous: Option<Vec<bool>> = None;
    for t in thresholds {
        let config = ExtractionConfig::default().with_review_threshold(t).unwrap();
        let flags: Vec<bool> = extract(&raw, &config)
            .entries
            .iter()
            .map(|e| e.human_review)
            .collect();
        if let Some(prev) = &previous {
            assert_eq!(prev.len(), flags.len());
            for (before, after) in prev.iter().zip(&flags) {
                assert!(!before || *after, "entry unflagged when raising threshold to {t}");
            }
        }
        previous = Some(flags);
    }
}

#[test]
fn weights_change_confidence_not_values() {
    let strict = ExtractionConfigBuilder::new()
        .match_weight(0.9)
        .partial_match_strength(0.1)
        .build()
        .unwrap();
    let raw = "서울 강남구 테헤란로 152 김철수 010-1234-5678";
    let a = default_extract(raw);
    let b = extract(raw, &strict);
    for field in Field::ALL {
        assert_eq!(a.entries[0].field_value(field), b.entries[0].field_value(field));
    }
    assert!(b.entries[0].field_confidence(Field::Sido) < a.entries[0].field_confidence(Field::Sido));
}

// ---------------------------------------------------------------------------
// Wire shape and metadata
// ---------------------------------------------------------------------------

#[test]
fn json_wire_shape() {
    let value = serde_json::to_value(default_extract(SCENARIO_A)).unwrap();
    let object = value.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec!["entries", "image_id", "processing_metadata", "total_entries"]
    );

    let entry = &value["entries"][0];
    for key in [
        "name",
        "phone_number",
        "phone_type",
        "address",
        "confidence",
        "entry_number",
        "human_review",
    ] {
        assert!(entry.get(key).is_some(), "entry missing {key}");
    }
    assert_eq!(entry["phone_type"], "cellphone");
    assert!(entry["confidence"].is_object());
    assert!(entry["address"]["confidence"]["floor"].is_number());
    assert!(entry["address"]["floor"].is_null());

    let back: MultiEntryResult = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(serde_json::to_value(back).unwrap(), value);
}

#[test]
fn metadata_records_text_and_boundaries() {
    let result = default_extract(SCENARIO_B);
    let meta = &result.processing_metadata;
    let text = meta["normalized_text"].as_str().unwrap();
    assert!(text.starts_with("김철수 010-1234-5678 서울특별시"));

    let boundaries = meta["segment_boundaries"].as_array().unwrap();
    assert_eq!(boundaries.len(), 2);
    assert_eq!(boundaries[0]["start"], 0);
    assert_eq!(boundaries[1]["signal"], "contact_line");
    let second_start = boundaries[1]["start"].as_u64().unwrap() as usize;
    assert!(text[second_start..].starts_with("이영희"));

    assert_eq!(meta["line_starts"].as_array().unwrap().len(), 4);
    assert_eq!(meta["entry_quality"].as_array().unwrap().len(), 2);
    assert_eq!(meta["review_reasons"].as_array().unwrap().len(), 2);
    assert_eq!(meta["config"]["review_threshold"], 0.6);
}

#[test]
fn image_id_is_stable_and_overridable() {
    let a = default_extract(SCENARIO_A);
    let b = default_extract(&format!("  {SCENARIO_A}  \n"));
    assert_eq!(a.image_id, b.image_id);
    assert_ne!(a.image_id, default_extract(SCENARIO_C).image_id);

    let custom = ContactExtractor::new().extract_with_id(SCENARIO_A, Some("scan-42".into()));
    assert_eq!(custom.image_id, "scan-42");
}

// ---------------------------------------------------------------------------
// Re-scoring
// ---------------------------------------------------------------------------

#[test]
fn noop_rescorer_changes_nothing_but_metadata() {
    let original = default_extract(SCENARIO_B);
    let rescored = apply_rescorer(&NoopRescorer, original.clone());
    assert_eq!(rescored.entries, original.entries);
    assert_eq!(rescored.processing_metadata["rescorer"], "noop");
}

#[test]
fn gazetteer_rescorer_flags_unknown_gangnam_road() {
    let raw = "서울특별시 강남구 자극로 10 김철수 010-1234-5678";
    let original = default_extract(raw);
    let rescored = apply_rescorer(&GazetteerRescorer::default(), original.clone());

    let entry = &rescored.entries[0];
    assert_eq!(entry.field_confidence(Field::Sido), 1.0);
    assert_eq!(entry.field_confidence(Field::Sigungu), 1.0);
    assert!(entry.field_confidence(Field::RoadName) <= 0.3);
    assert!(entry.human_review);
    assert_eq!(
        entry.field_value(Field::RoadName),
        original.entries[0].field_value(Field::RoadName)
    );
}

#[test]
fn gazetteer_rescorer_confirms_known_road() {
    let raw = "서울특별시 강남구 테헤란로 152 김철수 010-1234-5678";
    let rescored = apply_rescorer(&GazetteerRescorer::default(), default_extract(raw));
    let entry = &rescored.entries[0];
    assert_eq!(entry.field_confidence(Field::RoadName), 1.0);
    assert_eq!(
        entry.address.as_ref().unwrap().confidence["road_name"],
        1.0
    );
}
