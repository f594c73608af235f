use proptest::prelude::*;

use crate::parser::ChunkPolicy;
use crate::parser::tests::grammar::{max_depth_of, parse};
use crate::syntax::SyntaxKind::DummyBlock;

proptest! {
    /// The tree is lossless for arbitrary (mostly malformed) input: every
    /// recovery path must keep all tokens.
    #[test]
    fn parse_is_lossless(source in "[a-zA-Z0-9,;()*{}=' .\n-]{0,40}") {
        let result = parse(&source);
        prop_assert_eq!(result.parse.syntax().text().to_string(), source);
    }

    /// Keyword-shaped inputs exercise the statement grammar deeper.
    #[test]
    fn statement_fragments_are_lossless(
        words in proptest::collection::vec(
            prop_oneof![
                Just("SELECT"), Just("FROM"), Just("WHERE"), Just("("),
                Just(")"), Just(","), Just("*"), Just("="), Just("x"),
                Just("1"), Just(";"),
            ],
            0..24,
        )
    ) {
        let source = words.join(" ");
        let result = parse(&source);
        prop_assert_eq!(result.parse.syntax().text().to_string(), source);
    }

    /// Balanced chunking keeps depth logarithmic for any element count.
    #[test]
    fn chunk_depth_is_bounded(n in 1usize..220) {
        let source = (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let policy = ChunkPolicy::default();
        let rule = |p: &mut crate::parser::Parser<'_>, level: u32| -> bool {
            let marker = p.enter_section(
                level,
                crate::parser::Modifiers::NONE,
                Some(crate::syntax::SyntaxKind::SelectList),
                None,
            );
            let element = |p: &mut crate::parser::Parser<'_>, _l: u32| -> bool {
                p.consume_token_fast(crate::syntax::SyntaxKind::Ident)
            };
            let eat_more = |p: &mut crate::parser::Parser<'_>, _l: u32| -> bool { !p.eof() };
            let result = p.parse_as_tree(level + 1, DummyBlock, true, &element, &eat_more);
            p.exit_section(level, marker, None, result, false, None);
            result
        };
        let result = crate::parser::Parser::new(
            &source,
            crate::lexer::lex(&source),
            crate::syntax::LanguageConfig::flexible_search(),
        )
        .run(crate::syntax::SyntaxKind::Root, &rule);

        prop_assert_eq!(result.parse.syntax().text().to_string(), source.clone());

        let chunks = n.div_ceil(policy.chunk_size).max(1);
        let mut bound = 1usize;
        let mut reach = 1usize;
        while reach < chunks {
            reach *= policy.merge_at;
            bound += 1;
        }
        let depth = max_depth_of(&result.parse.syntax(), DummyBlock);
        prop_assert!(depth <= bound, "n={} depth={} bound={}", n, depth, bound);
    }
}
