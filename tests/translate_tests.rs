mod common;

use brrtbench::spec::{parse_api, Segment};
use brrtbench::translate::{parse_native, translate, translate_spec, ParamStyle, Syntax};
use common::catch_all_spec;

#[test]
fn test_translation_recovers_segments_for_every_syntax() {
    let spec = parse_api();
    for syntax in [Syntax::COLON, Syntax::BRACE] {
        for (index, route) in spec.routes().iter().enumerate() {
            let translated = translate(route, index, "any", syntax).unwrap();
            let parsed = parse_native(&translated.pattern, syntax.style).unwrap();
            assert_eq!(parsed.as_slice(), route.segments(), "{}", translated.pattern);
            assert_eq!(
                translated.param_names,
                route.param_names().collect::<Vec<_>>(),
                "{}",
                translated.pattern
            );
            assert_eq!(translated.method, route.method);
        }
    }
}

#[test]
fn test_brace_and_colon_patterns() {
    let spec = catch_all_spec();
    let colon = translate_spec(&spec, "matchit", Syntax::COLON);
    let brace = translate_spec(&spec, "regex", Syntax::BRACE);

    let colon_patterns: Vec<_> = colon.routes.iter().map(|r| r.pattern.as_str()).collect();
    let brace_patterns: Vec<_> = brace.routes.iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(
        colon_patterns,
        [
            "/1/users",
            "/1/classes/:className",
            "/1/classes/:className/:objectId",
            "/static/*filepath"
        ]
    );
    assert_eq!(
        brace_patterns,
        [
            "/1/users",
            "/1/classes/{className}",
            "/1/classes/{className}/{objectId}",
            "/static/{*filepath}"
        ]
    );
}

#[test]
fn test_unsupported_route_is_excluded_not_substituted() {
    let spec = catch_all_spec();
    let table = translate_spec(&spec, "radix", Syntax::BRACE.without_catch_all());

    assert_eq!(table.canonical_count, 4);
    assert_eq!(table.excluded.len(), 1);
    assert_eq!(table.effective_count(), spec.len() - table.excluded.len());
    assert_eq!(table.excluded[0].pattern, "/static/*filepath");
    assert_eq!(table.excluded[0].adapter, "radix");
    assert!(!table.is_effective(3));
    assert!(table.is_effective(2));
    assert!(table.routes.iter().all(|r| !r.pattern.contains('*')));
}

#[test]
fn test_parse_native_catch_all() {
    let segments = parse_native("/static/{*filepath}", ParamStyle::Brace).unwrap();
    assert_eq!(
        segments,
        vec![
            Segment::Static("static".to_string()),
            Segment::CatchAll("filepath".to_string())
        ]
    );
}
