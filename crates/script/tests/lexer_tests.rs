use arith_script::{LexError, Token, TokenKind, tokenize};

fn kinds(input: &str) -> Vec<(TokenKind, String)> {
    tokenize(input)
        .expect("tokenize should succeed")
        .into_iter()
        .map(|token| (token.kind, token.text))
        .collect()
}

#[test]
fn classifies_every_token_kind() {
    use TokenKind::*;

    assert_eq!(
        kinds("max(a, 12) % 'x'\n"),
        vec![
            (FunctionName, "max".to_string()),
            (Control, "(".to_string()),
            (Variable, "a".to_string()),
            (Comma, ",".to_string()),
            (Whitespace, " ".to_string()),
            (Number, "12".to_string()),
            (Control, ")".to_string()),
            (Whitespace, " ".to_string()),
            (Operator, "%".to_string()),
            (Whitespace, " ".to_string()),
            (StringLiteral, "'x'".to_string()),
            (NewLine, "\n".to_string()),
        ]
    );
}

#[test]
fn identifier_followed_by_paren_is_a_function_name() {
    assert_eq!(kinds("f(")[0].0, TokenKind::FunctionName);
    // A space in between makes it a variable.
    assert_eq!(kinds("f (")[0].0, TokenKind::Variable);
    assert_eq!(kinds("_tmp1")[0], (TokenKind::Variable, "_tmp1".to_string()));
}

#[test]
fn number_followed_by_letters_splits() {
    assert_eq!(
        kinds("123ab"),
        vec![
            (TokenKind::Number, "123".to_string()),
            (TokenKind::Variable, "ab".to_string()),
        ]
    );
}

#[test]
fn string_literals_keep_quotes_and_escapes() {
    assert_eq!(
        kinds(r#""say \"hi\"""#),
        vec![(TokenKind::StringLiteral, r#""say \"hi\"""#.to_string())]
    );
    assert_eq!(
        kinds(r"'it\'s'"),
        vec![(TokenKind::StringLiteral, r"'it\'s'".to_string())]
    );
    // The other quote character does not close the literal.
    assert_eq!(
        kinds(r#"'a"b'"#),
        vec![(TokenKind::StringLiteral, r#"'a"b'"#.to_string())]
    );
}

#[test]
fn unterminated_string_is_an_error() {
    let err = tokenize("1 + 'abc").expect_err("tokenize should fail");
    assert_eq!(err, LexError::UnterminatedString { line: 1, column: 4 });

    let err = tokenize(r#""abc\""#).expect_err("escaped quote does not close");
    assert!(matches!(err, LexError::UnterminatedString { .. }));
}

#[test]
fn positions_track_lines_and_columns() {
    let tokens: Vec<Token> = tokenize("a +\n  bc")
        .expect("tokenize should succeed")
        .into_iter()
        .filter(|token| !matches!(token.kind, TokenKind::Whitespace | TokenKind::NewLine))
        .collect();

    let positions: Vec<(&str, usize, usize)> = tokens
        .iter()
        .map(|token| (token.text.as_str(), token.line, token.column))
        .collect();
    assert_eq!(positions, vec![("a", 1, 0), ("+", 1, 2), ("bc", 2, 2)]);
}

#[test]
fn unknown_character_reports_position_and_context() {
    let err = tokenize("1 +\n2 $ 3").expect_err("tokenize should fail");
    match err {
        LexError::UnexpectedCharacter {
            found,
            line,
            column,
            context,
        } => {
            assert_eq!(found, '$');
            assert_eq!(line, 2);
            assert_eq!(column, 2);
            assert_eq!(context, "1 +\n2 $");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_input_has_no_tokens() {
    assert!(tokenize("").expect("tokenize should succeed").is_empty());
}

#[test]
fn unicode_letters_are_identifiers() {
    assert_eq!(kinds("größe"), vec![(TokenKind::Variable, "größe".to_string())]);
}
