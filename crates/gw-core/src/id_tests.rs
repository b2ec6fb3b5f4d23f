use super::*;

crate::define_id! {
    pub struct TestId;
}

#[yare::parameterized(
    longer_than_width  = { "abcdefghij", 4, "abcd" },
    shorter_than_width = { "ab",         4, "ab" },
    exactly_width      = { "abcd",       4, "abcd" },
    zero_width         = { "abcd",       0, "" },
)]
fn short_truncates_to_width(raw: &str, width: usize, expected: &str) {
    let id = TestId::new(raw);
    assert_eq!(id.short(width), expected);
}

#[test]
fn equality_against_str_and_borrow() {
    let id = TestId::new("same");
    assert_eq!(id, "same");
    assert_eq!(id, *"same".to_string().as_str());
    let as_borrowed: &str = std::borrow::Borrow::borrow(&id);
    assert_eq!(as_borrowed, "same");
}

#[test]
fn uuid_id_gen_produces_unique_values() {
    let gen = UuidIdGen;
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a.len(), 36);
}
