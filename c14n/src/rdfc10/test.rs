use super::*;
use ldtk_api::nq::parse_str;

fn c14n_nquads(d: &Dataset) -> Result<String> {
    let mut output = Vec::<u8>::new();
    normalize(d, &mut output)?;
    Ok(String::from_utf8(output).unwrap())
}

fn dataset(lines: &[&str]) -> Dataset {
    parse_str(&lines.join("\n")).unwrap()
}

fn check(lines: &[&str], exp: &str) {
    crate::test_setup();
    let got = c14n_nquads(&dataset(lines)).unwrap();
    println!(">>>> GOT\n{got}>>>> EXPECTED\n{exp}<<<<");
    assert_eq!(got, exp);
}

const CYCLE5: &[&str] = &[
    "_:e0 <http://example.com/#p> _:e1 .",
    "_:e1 <http://example.com/#p> _:e2 .",
    "_:e2 <http://example.com/#p> _:e3 .",
    "_:e3 <http://example.com/#p> _:e4 .",
    "_:e4 <http://example.com/#p> _:e0 .",
];

const CLIQUE5: &[&str] = &[
    "_:e0 <http://example.com/#p> _:e1 .",
    "_:e0 <http://example.com/#p> _:e2 .",
    "_:e0 <http://example.com/#p> _:e3 .",
    "_:e0 <http://example.com/#p> _:e4 .",
    "_:e1 <http://example.com/#p> _:e0 .",
    "_:e1 <http://example.com/#p> _:e2 .",
    "_:e1 <http://example.com/#p> _:e3 .",
    "_:e1 <http://example.com/#p> _:e4 .",
    "_:e2 <http://example.com/#p> _:e0 .",
    "_:e2 <http://example.com/#p> _:e1 .",
    "_:e2 <http://example.com/#p> _:e3 .",
    "_:e2 <http://example.com/#p> _:e4 .",
    "_:e3 <http://example.com/#p> _:e0 .",
    "_:e3 <http://example.com/#p> _:e1 .",
    "_:e3 <http://example.com/#p> _:e2 .",
    "_:e3 <http://example.com/#p> _:e4 .",
    "_:e4 <http://example.com/#p> _:e0 .",
    "_:e4 <http://example.com/#p> _:e1 .",
    "_:e4 <http://example.com/#p> _:e2 .",
    "_:e4 <http://example.com/#p> _:e3 .",
];

#[test]
fn example2() {
    check(
        &[
            "<http://example.com/#p> <http://example.com/#q> _:e0 .",
            "<http://example.com/#p> <http://example.com/#r> _:e1 .",
            "_:e0 <http://example.com/#s> <http://example.com/#u> .",
            "_:e1 <http://example.com/#t> <http://example.com/#u> .",
        ],
        r"<http://example.com/#p> <http://example.com/#q> _:c14n0 .
<http://example.com/#p> <http://example.com/#r> _:c14n1 .
_:c14n0 <http://example.com/#s> <http://example.com/#u> .
_:c14n1 <http://example.com/#t> <http://example.com/#u> .
",
    );
}

#[test]
fn example3() {
    check(
        &[
            "<http://example.com/#p> <http://example.com/#q> _:e0 .",
            "<http://example.com/#p> <http://example.com/#q> _:e1 .",
            "_:e0 <http://example.com/#p> _:e2 .",
            "_:e1 <http://example.com/#p> _:e3 .",
            "_:e2 <http://example.com/#r> _:e3 .",
        ],
        r"<http://example.com/#p> <http://example.com/#q> _:c14n2 .
<http://example.com/#p> <http://example.com/#q> _:c14n3 .
_:c14n0 <http://example.com/#r> _:c14n1 .
_:c14n2 <http://example.com/#p> _:c14n1 .
_:c14n3 <http://example.com/#p> _:c14n0 .
",
    );
}

#[test]
fn cycle5() {
    check(
        CYCLE5,
        r"_:c14n0 <http://example.com/#p> _:c14n4 .
_:c14n1 <http://example.com/#p> _:c14n0 .
_:c14n2 <http://example.com/#p> _:c14n1 .
_:c14n3 <http://example.com/#p> _:c14n2 .
_:c14n4 <http://example.com/#p> _:c14n3 .
",
    );
}

#[test]
fn cycle5_too_deep() {
    crate::test_setup();
    let mut output = Vec::<u8>::new();
    // set depth_factor too low for this graph
    let res = normalize_with::<Sha256, _>(
        &dataset(CYCLE5),
        &mut output,
        0.5,
        2 * DEFAULT_PERMUTATION_LIMIT,
    );
    assert!(matches!(res, Err(C14nError::ComplexityExceeded(_))));
}

#[test]
fn clique5() {
    let exp: String = (0..5)
        .flat_map(|i| {
            (0..5)
                .filter(move |j| *j != i)
                .map(move |j| format!("_:c14n{i} <http://example.com/#p> _:c14n{j} .\n"))
        })
        .collect();
    check(CLIQUE5, &exp);
}

#[test]
fn clique5_too_many_permutations() {
    crate::test_setup();
    let mut output = Vec::<u8>::new();
    // set permutation limit too low for this graph
    let res = normalize_with::<Sha256, _>(
        &dataset(CLIQUE5),
        &mut output,
        2.0 * DEFAULT_DEPTH_FACTOR,
        3,
    );
    assert!(matches!(res, Err(C14nError::ComplexityExceeded(_))));
}

#[test]
fn cycle2plus3() {
    check(
        &[
            "_:e0 <http://example.com/#p> _:e1 .",
            "_:e1 <http://example.com/#p> _:e0 .",
            "_:e2 <http://example.com/#p> _:e3 .",
            "_:e3 <http://example.com/#p> _:e4 .",
            "_:e4 <http://example.com/#p> _:e2 .",
        ],
        r"_:c14n0 <http://example.com/#p> _:c14n1 .
_:c14n1 <http://example.com/#p> _:c14n0 .
_:c14n2 <http://example.com/#p> _:c14n4 .
_:c14n3 <http://example.com/#p> _:c14n2 .
_:c14n4 <http://example.com/#p> _:c14n3 .
",
    );
}

#[test]
fn tricky_order() {
    check(
        &[
            "<tag:a> <tag:p> _:a .",
            "<tag:a> <tag:p> <tag:a> .",
            "<tag:a> <tag:p> \"a\" .",
            "<tag:a> <tag:p> \"a!\" .",
            "<tag:a9> <tag:p> \"a!\" .",
        ],
        r#"<tag:a9> <tag:p> "a!" .
<tag:a> <tag:p> "a!" .
<tag:a> <tag:p> "a" .
<tag:a> <tag:p> <tag:a> .
<tag:a> <tag:p> _:c14n0 .
"#,
    );
}

#[test]
fn example2_sha384() {
    crate::test_setup();
    let d = dataset(&[
        "<http://example.com/#p> <http://example.com/#q> _:e0 .",
        "<http://example.com/#p> <http://example.com/#r> _:e1 .",
        "_:e0 <http://example.com/#s> <http://example.com/#u> .",
        "_:e1 <http://example.com/#t> <http://example.com/#u> .",
    ]);
    let exp = r"<http://example.com/#p> <http://example.com/#q> _:c14n1 .
<http://example.com/#p> <http://example.com/#r> _:c14n0 .
_:c14n0 <http://example.com/#t> <http://example.com/#u> .
_:c14n1 <http://example.com/#s> <http://example.com/#u> .
";
    let mut got = Vec::<u8>::new();
    normalize_sha384(&d, &mut got).unwrap();
    assert_eq!(String::from_utf8(got).unwrap(), exp);
}

#[test]
fn named_graphs_and_self_loop() {
    check(
        &[
            "_:x <http://example.com/#p> _:x _:g .",
            "_:g <http://example.com/#name> \"graph\" .",
        ],
        r#"_:c14n0 <http://example.com/#name> "graph" .
_:c14n1 <http://example.com/#p> _:c14n1 _:c14n0 .
"#,
    );
}

#[test]
fn relabel_map() {
    crate::test_setup();
    let (quads, map) = relabel(&dataset(CYCLE5)).unwrap();
    assert_eq!(quads.len(), 5);
    assert_eq!(map.len(), 5);
    let mut canonical: Vec<_> = map.values().map(|v| v.to_string()).collect();
    canonical.sort();
    assert_eq!(canonical, ["c14n0", "c14n1", "c14n2", "c14n3", "c14n4"]);
}

#[test]
fn unsupported_bnode_predicate() {
    crate::test_setup();
    let mut d = Dataset::new();
    d.insert_spog(
        Term::new_iri_unchecked("http://example.com/s"),
        Term::new_bnode_unchecked("p"),
        Term::new_iri_unchecked("http://example.com/o"),
        None,
    );
    assert!(matches!(relabel(&d), Err(C14nError::Unsupported(_))));
}

#[test]
fn insensitive_to_quad_order() {
    crate::test_setup();
    let lines = [
        "<http://example.com/#p> <http://example.com/#q> _:e0 .",
        "<http://example.com/#p> <http://example.com/#q> _:e1 .",
        "_:e0 <http://example.com/#p> _:e2 .",
        "_:e1 <http://example.com/#p> _:e3 .",
        "_:e2 <http://example.com/#r> _:e3 .",
        "_:e3 <http://example.com/#label> \"x\"@en <http://example.com/#g> .",
    ];
    let exp = c14n_nquads(&dataset(&lines)).unwrap();
    for rotation in 1..lines.len() {
        let mut permuted = lines.to_vec();
        permuted.rotate_left(rotation);
        assert_eq!(c14n_nquads(&dataset(&permuted)).unwrap(), exp);
        permuted.reverse();
        assert_eq!(c14n_nquads(&dataset(&permuted)).unwrap(), exp);
    }
}

#[test]
fn isomorphism_sensitivity() {
    crate::test_setup();
    let d1 = dataset(&[
        "_:a <http://example.com/#p> _:b .",
        "_:b <http://example.com/#p> _:c .",
    ]);
    let d2 = dataset(&[
        "_:y <http://example.com/#p> _:z .",
        "_:x <http://example.com/#p> _:y .",
    ]);
    let d3 = dataset(&[
        "_:a <http://example.com/#p> _:b .",
        "_:c <http://example.com/#p> _:b .",
    ]);
    let n1 = c14n_nquads(&d1).unwrap();
    assert_eq!(n1, c14n_nquads(&d2).unwrap());
    assert_ne!(n1, c14n_nquads(&d3).unwrap());
}
