//! Static tables of Korean administrative names.
//!
//! Used by the parser to recognise 시/도 tokens and by the mock
//! [`GazetteerRescorer`](crate::rescore::GazetteerRescorer) to validate
//! extracted components.

/// A written form of a 시/도 (top-level division).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidoForm {
    pub text: &'static str,
    pub canonical: &'static str,
    /// `true` for the current official name, `false` for short or legacy forms.
    pub official: bool,
}

const fn official(text: &'static str) -> SidoForm {
    SidoForm {
        text,
        canonical: text,
        official: true,
    }
}

const fn alias(text: &'static str, canonical: &'static str) -> SidoForm {
    SidoForm {
        text,
        canonical,
        official: false,
    }
}

/// Official names first, then short and legacy forms.
///
/// `광주시` is deliberately absent: it is also a city inside 경기도.
pub static SIDO_FORMS: &[SidoForm] = &[
    official("서울특별시"),
    official("부산광역시"),
    official("대구광역시"),
    official("인천광역시"),
    official("광주광역시"),
    official("대전광역시"),
    official("울산광역시"),
    official("세종특별자치시"),
    official("경기도"),
    official("강원특별자치도"),
    official("충청북도"),
    official("충청남도"),
    official("전북특별자치도"),
    official("전라남도"),
    official("경상북도"),
    official("경상남도"),
    official("제주특별자치도"),
    alias("서울시", "서울특별시"),
    alias("서울", "서울특별시"),
    alias("부산시", "부산광역시"),
    alias("부산", "부산광역시"),
    alias("대구시", "대구광역시"),
    alias("대구", "대구광역시"),
    alias("인천시", "인천광역시"),
    alias("인천", "인천광역시"),
    alias("광주", "광주광역시"),
    alias("대전시", "대전광역시"),
    alias("대전", "대전광역시"),
    alias("울산시", "울산광역시"),
    alias("울산", "울산광역시"),
    alias("세종시", "세종특별자치시"),
    alias("세종", "세종특별자치시"),
    alias("경기", "경기도"),
    alias("강원도", "강원특별자치도"),
    alias("강원", "강원특별자치도"),
    alias("충북", "충청북도"),
    alias("충남", "충청남도"),
    alias("전라북도", "전북특별자치도"),
    alias("전북", "전북특별자치도"),
    alias("전남", "전라남도"),
    alias("경북", "경상북도"),
    alias("경남", "경상남도"),
    alias("제주도", "제주특별자치도"),
    alias("제주", "제주특별자치도"),
];

/// The 25 autonomous districts of 서울특별시.
pub static SEOUL_DISTRICTS: &[&str] = &[
    "종로구", "중구", "용산구", "성동구", "광진구", "동대문구", "중랑구", "성북구", "강북구",
    "도봉구", "노원구", "은평구", "서대문구", "마포구", "양천구", "강서구", "구로구", "금천구",
    "영등포구", "동작구", "관악구", "서초구", "강남구", "송파구", "강동구",
];

/// A road with its standardized name and the misspellings seen in OCR output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoadEntry {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

const fn road(name: &'static str, aliases: &'static [&'static str]) -> RoadEntry {
    RoadEntry { name, aliases }
}

/// Roads of 강남구.
pub static GANGNAM_ROADS: &[RoadEntry] = &[
    road("테헤란로", &["테헤란", "테헤란길"]),
    road("강남대로", &["강남로"]),
    road("논현로", &["논현길"]),
    road("언주로", &["언주길"]),
    road("자곡로", &["자곡길"]),
    road("압구정로", &["압구정길"]),
    road("도산대로", &["도산길"]),
    road("학동로", &["학동길"]),
    road("봉은사로", &["봉은사길"]),
    road("헌릉로", &["헌릉길"]),
    road("일원로", &["일원길"]),
    road("밤고개로", &["밤고개길"]),
    road("남부순환로", &["남부순환길"]),
    road("개포로", &["개포길"]),
    road("양재대로", &["양재길"]),
    road("광평로", &["광평길"]),
];

/// Look up the written form of a 시/도 token.
pub fn sido_form(text: &str) -> Option<&'static SidoForm> {
    SIDO_FORMS.iter().find(|f| f.text == text)
}

/// Canonical official name for any known written form.
pub fn canonical_sido(text: &str) -> Option<&'static str> {
    sido_form(text).map(|f| f.canonical)
}

/// Districts listed for a canonical 시/도, if the table covers it.
pub fn districts_of(canonical_sido: &str) -> Option<&'static [&'static str]> {
    match canonical_sido {
        "서울특별시" => Some(SEOUL_DISTRICTS),
        _ => None,
    }
}

/// Roads listed for a district, if the table covers it.
pub fn roads_of(canonical_sido: &str, district: &str) -> Option<&'static [RoadEntry]> {
    match (canonical_sido, district) {
        ("서울특별시", "강남구") => Some(GANGNAM_ROADS),
        _ => None,
    }
}

/// Standardized road name for a road or one of its known aliases.
///
/// Trailing branch numbers (`테헤란로 5길`) are ignored for the lookup.
pub fn canonical_road(roads: &[RoadEntry], road_name: &str) -> Option<&'static str> {
    let head = road_name.split_whitespace().next().unwrap_or(road_name);
    roads
        .iter()
        .find(|r| r.name == head || r.aliases.contains(&head))
        .map(|r| r.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_points_at_an_official_name() {
        for form in SIDO_FORMS.iter().filter(|f| !f.official) {
            let target = sido_form(form.canonical).expect("canonical form listed");
            assert!(target.official, "{} -> {}", form.text, form.canonical);
        }
    }

    #[test]
    fn seventeen_official_names() {
        assert_eq!(SIDO_FORMS.iter().filter(|f| f.official).count(), 17);
    }

    #[test]
    fn canonical_sido_resolves_aliases() {
        assert_eq!(canonical_sido("서울시"), Some("서울특별시"));
        assert_eq!(canonical_sido("서울특별시"), Some("서울특별시"));
        assert_eq!(canonical_sido("광주시"), None);
    }

    #[test]
    fn road_lookup_ignores_branch_number() {
        assert_eq!(canonical_road(GANGNAM_ROADS, "테헤란로 5길"), Some("테헤란로"));
        assert_eq!(canonical_road(GANGNAM_ROADS, "자곡길"), Some("자곡로"));
        assert_eq!(canonical_road(GANGNAM_ROADS, "화랑로"), None);
    }

    #[test]
    fn only_seoul_has_district_table() {
        assert_eq!(districts_of("서울특별시").map(|d| d.len()), Some(25));
        assert!(districts_of("부산광역시").is_none());
        assert!(roads_of("서울특별시", "강남구").is_some());
        assert!(roads_of("서울특별시", "성북구").is_none());
    }
}
