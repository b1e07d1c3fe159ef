use avatar_catalog::parser::{IdPattern, InputParser};

#[test]
fn accepts_bare_ids_links_and_csv_rows_in_order() {
    let text = "\
avtr_aaa
https://vrchat.com/home/avatar/avtr_bbb-01
https://vrchat.com/api/1/avatars/avtr_ccc?foo=1
\"avtr_ddd\",Some Name,Author
avtr_aaa
";
    let ids = InputParser::default().parse(text);
    assert_eq!(
        ids,
        ["avtr_aaa", "avtr_bbb-01", "avtr_ccc", "avtr_ddd", "avtr_aaa"]
    );
}

#[test]
fn drops_noise_and_malformed_lines() {
    let text = "hello\n\n   \navtr_XYZ\navtr_\nusr_abc\nnot,avtr_aaa\navtr_12 34\r\n";
    assert!(InputParser::default().parse(text).is_empty());
}

#[test]
fn links_with_foreign_characters_in_the_id_are_dropped() {
    let text = "\
https://vrchat.com/home/avatar/avtr_12ab-CDEF-3456
https://vrchat.com/home/avatar/avtr_abcxyz
https://vrchat.com/home/avatar/avtr_abc_def?x=1
https://vrchat.com/home/avatar/avtr_abc/details
";
    assert_eq!(InputParser::default().parse(text), ["avtr_abc"]);
}

#[test]
fn csv_rows_only_look_at_the_first_field() {
    // A link in a later column must not leak through.
    let text = "ID,Name,Author Name\nname,https://vrchat.com/home/avatar/avtr_abc,x";
    assert!(InputParser::default().parse(text).is_empty());

    let quoted = "\"avtr_abc\",\"Fox, the\",Someone";
    assert_eq!(InputParser::default().parse(quoted), ["avtr_abc"]);
}

#[test]
fn handles_crlf_and_surrounding_whitespace() {
    let ids = InputParser::default().parse("  avtr_01  \r\n\tavtr_02\r\n");
    assert_eq!(ids, ["avtr_01", "avtr_02"]);
}

#[test]
fn custom_prefix_is_respected() {
    let pattern = IdPattern::new("wrld_").expect("pattern");
    assert_eq!(pattern.prefix(), "wrld_");
    assert!(pattern.is_valid("wrld_0f"));
    assert!(!pattern.is_valid("avtr_0f"));

    let parser = InputParser::new(pattern);
    assert_eq!(parser.parse("avtr_01\nwrld_02"), ["wrld_02"]);
}
