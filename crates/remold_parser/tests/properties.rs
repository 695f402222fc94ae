//! Property tests for the reader and the settings parser.

use std::io::Read;

use proptest::prelude::*;
use proptest::sample::Index;
use remold_parser::{FormatPreservingReader, OffsetUnit, Parser, SettingsParser};
use remold_tree::print_document;

/// Characters from every UTF-8 width, combining marks and surrogate pairs.
fn char_class() -> impl Strategy<Value = char> {
    prop_oneof![
        proptest::char::range('a', 'z'),
        Just(' '),
        Just('\n'),
        Just('\t'),
        proptest::char::range('\u{00C0}', '\u{00FF}'),
        proptest::char::range('\u{0300}', '\u{036F}'),
        proptest::char::range('\u{3040}', '\u{30FF}'),
        proptest::char::range('\u{1F600}', '\u{1F64F}'),
    ]
}

fn offset_unit() -> impl Strategy<Value = OffsetUnit> {
    prop_oneof![
        Just(OffsetUnit::Byte),
        Just(OffsetUnit::Char),
        Just(OffsetUnit::Utf16),
    ]
}

fn word() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_.é日😀-]{1,6}"
}

fn item() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (word(), "[ \t]{0,2}", "[ \t]{1,3}", word())
            .prop_map(|(key, before, after, value)| format!("{key}{before}:{after}{value}")),
        prop::collection::vec(word(), 1..4).prop_map(|words| words.join(" ")),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            word(),
            prop::collection::vec(("[ \t]{0,4}", inner), 0..4),
            "[ \t]{0,2}",
        )
            .prop_map(|(name, children, close_indent)| {
                let mut out = format!("{name} {{");
                for (indent, child) in children {
                    out.push('\n');
                    out.push_str(&indent);
                    out.push_str(&child);
                }
                out.push('\n');
                out.push_str(&close_indent);
                out.push('}');
                out
            })
    })
}

fn document() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(("(#[ a-zé😀]{0,8}\n)?", item()), 0..6),
        "[ \n]{0,2}",
    )
        .prop_map(|(items, tail)| {
            let mut out = String::new();
            for (comment, item) in items {
                out.push_str(&comment);
                out.push_str(&item);
                out.push('\n');
            }
            out.push_str(&tail);
            out
        })
}

proptest! {
    #[test]
    fn test_prefix_matches_direct_slicing(
        chars in prop::collection::vec(char_class(), 0..48),
        cuts in prop::collection::vec(any::<Index>(), 0..6),
        unit in offset_unit(),
    ) {
        let text: String = chars.iter().collect();

        // Event offsets of every character boundary.
        let mut bounds = vec![0];
        for ch in &chars {
            bounds.push(bounds[bounds.len() - 1] + unit.width(*ch));
        }
        let mut picks: Vec<usize> = cuts.iter().map(|cut| cut.index(chars.len() + 1)).collect();
        picks.sort_unstable();

        let mut reader = FormatPreservingReader::with_unit(text.as_bytes(), unit);
        let mut sink = Vec::new();
        reader.read_to_end(&mut sink).unwrap();
        prop_assert_eq!(reader.consumed(), bounds[chars.len()]);

        let mut last = 0;
        for pick in picks {
            let expected: String = chars[last..pick].iter().collect();
            if pick > last {
                let token = reader.substring(bounds[last], bounds[pick] - 1).unwrap();
                prop_assert_eq!(&token, &expected);
            }
            let prefix = reader.prefix_between(bounds[last], bounds[pick]).unwrap();
            prop_assert_eq!(prefix, expected);
            last = pick;
        }
    }

    #[test]
    fn test_parse_print_round_trip(source in document(), chunk_size in 1usize..8) {
        let doc = SettingsParser::with_chunk_size(chunk_size)
            .parse_reader(source.as_bytes())
            .unwrap();
        prop_assert_eq!(print_document(&doc), source);
    }

    #[test]
    fn test_arbitrary_text_round_trips_when_it_parses(
        chars in prop::collection::vec(
            prop_oneof![char_class(), Just(':'), Just('{'), Just('}'), Just('#'), Just('"')],
            0..64,
        ),
    ) {
        let source: String = chars.into_iter().collect();
        if let Ok(doc) = SettingsParser::new().parse(&source) {
            prop_assert_eq!(print_document(&doc), source);
        }
    }
}
