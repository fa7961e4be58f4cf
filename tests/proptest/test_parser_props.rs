//! Property tests for the template parser
//!
//! The parser is total and deterministic, so it should uphold structural
//! properties across arbitrary inputs: command order preservation, block
//! splitting on directives, and stability across reparses.

use proptest::prelude::*;

use gaiactl::models::Block;
use gaiactl::template;

/// Command lines that cannot be mistaken for directives or comments
fn command_line() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9 ]{0,30}[a-z0-9]".prop_map(|s| s.trim().to_string())
}

proptest! {
    #[test]
    fn prop_commands_form_single_block_in_order(commands in prop::collection::vec(command_line(), 1..20)) {
        let text = commands.join("\n");
        let parsed = template::parse(&text);

        prop_assert_eq!(parsed.len(), 1);
        match &parsed.blocks()[0] {
            Block::Clish { items } => prop_assert_eq!(items, &commands),
            other => prop_assert!(false, "expected clish block, got {:?}", other),
        }
    }

    #[test]
    fn prop_sleep_splits_into_alternating_blocks(
        runs in prop::collection::vec((prop::collection::vec(command_line(), 1..5), 0u64..600), 1..8)
    ) {
        let mut text = String::new();
        for (commands, seconds) in &runs {
            text.push_str(&commands.join("\n"));
            text.push('\n');
            text.push_str(&format!("::Sleep {}\n", seconds));
        }

        let parsed = template::parse(&text);
        prop_assert_eq!(parsed.len(), runs.len() * 2);

        for (i, (commands, seconds)) in runs.iter().enumerate() {
            match &parsed.blocks()[i * 2] {
                Block::Clish { items } => prop_assert_eq!(items, commands),
                other => prop_assert!(false, "expected clish block, got {:?}", other),
            }
            prop_assert_eq!(&parsed.blocks()[i * 2 + 1], &Block::Sleep { seconds: *seconds });
        }
    }

    #[test]
    fn prop_parse_is_stable_across_reparses(text in "[ -~\n]{0,400}") {
        let first = template::parse(&text);
        let second = template::parse(&text);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_whitespace_padding_is_irrelevant(commands in prop::collection::vec(command_line(), 1..10)) {
        let plain = commands.join("\n");
        let padded: String = commands
            .iter()
            .map(|c| format!("  {}  \n", c))
            .collect();
        prop_assert_eq!(template::parse(&plain), template::parse(&padded));
    }

    #[test]
    fn prop_comments_never_produce_blocks(
        commands in prop::collection::vec(command_line(), 0..5),
        comments in prop::collection::vec("#[ -~]{0,30}", 0..5),
    ) {
        let mut with_comments = String::new();
        for (i, comment) in comments.iter().enumerate() {
            with_comments.push_str(comment);
            with_comments.push('\n');
            if let Some(command) = commands.get(i) {
                with_comments.push_str(command);
                with_comments.push('\n');
            }
        }
        for command in commands.iter().skip(comments.len()) {
            with_comments.push_str(command);
            with_comments.push('\n');
        }

        let plain = commands.join("\n");
        prop_assert_eq!(template::parse(&with_comments), template::parse(&plain));
    }
}
