#[cfg(test)]
mod scanner_tests {
    use rox::error::{Diagnostics, LoxError};
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len(), "tokens: {:?}", tokens);

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_arithmetic_round_trip() {
        let tokens: Vec<Token> = Scanner::new("1+2").filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].literal(), Some(Literal::Number(1.0)));
        assert_eq!(tokens[1].token_type, TokenType::PLUS);
        assert_eq!(tokens[2].literal(), Some(Literal::Number(2.0)));
        assert_eq!(tokens[3].token_type, TokenType::EOF);

        let rebuilt: String = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(rebuilt, "1+2");
    }

    #[test]
    fn test_scanner_03_compound_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords_and_identifiers() {
        assert_token_sequence(
            "or orchid _under var1 class while",
            &[
                (TokenType::OR, "or"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "var1"),
                (TokenType::CLASS, "class"),
                (TokenType::WHILE, "while"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_number_trailing_dot_is_not_consumed() {
        let tokens: Vec<Token> = Scanner::new("123. 4.5").filter_map(Result::ok).collect();

        assert_eq!(tokens[0].lexeme, "123");
        assert_eq!(tokens[0].literal(), Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].token_type, TokenType::DOT);
        assert_eq!(tokens[2].lexeme, "4.5");
        assert_eq!(tokens[2].literal(), Some(Literal::Number(4.5)));
    }

    #[test]
    fn test_scanner_06_strings_and_comments() {
        let source = "\"hello\" // ignored until newline\n\"multi\nline\"";
        let tokens: Vec<Token> = Scanner::new(source).filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].literal(), Some(Literal::Str("hello".to_string())));
        assert_eq!(tokens[0].line, 1);
        assert_eq!(
            tokens[1].literal(),
            Some(Literal::Str("multi\nline".to_string()))
        );
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].token_type, TokenType::EOF);
        assert_eq!(tokens[2].line, 3);
    }

    #[test]
    fn test_scanner_07_unterminated_string_adds_no_token() {
        let results: Vec<_> = Scanner::new("print \"oops").collect();

        assert_eq!(results.len(), 3);
        assert!(matches!(&results[0], Ok(t) if t.token_type == TokenType::PRINT));
        match &results[1] {
            Err(LoxError::Lex { message, line }) => {
                assert_eq!(message, "Unterminated string.");
                assert_eq!(*line, 1);
            }
            other => panic!("expected lex error, got {:?}", other),
        }
        assert!(matches!(&results[2], Ok(t) if t.token_type == TokenType::EOF));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            let message = err.to_string();
            assert!(
                message.contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                message
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_multibyte_character_reported_once() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("a é b", &mut diagnostics);

        assert_eq!(diagnostics.static_errors.len(), 1);
        assert_eq!(
            diagnostics.static_errors[0],
            "[line 1] Error: Unexpected character: é"
        );
        assert_eq!(tokens.len(), 3); // a, b, EOF
    }

    #[test]
    fn test_scan_tokens_reports_and_continues() {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens("var x = 1;\n@\nvar y = 2;", &mut diagnostics);

        assert_eq!(
            diagnostics.static_errors,
            vec!["[line 2] Error: Unexpected character: @".to_string()]
        );
        assert_eq!(tokens.len(), 11);
        assert_eq!(tokens.last().map(|t| t.line), Some(3));
    }

    #[test]
    fn test_token_display() {
        let tokens: Vec<Token> = Scanner::new("var n = 42; \"hi\" 1.5")
            .filter_map(Result::ok)
            .collect();
        let printed: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            printed,
            vec![
                "VAR var null",
                "IDENTIFIER n null",
                "EQUAL = null",
                "NUMBER 42 42.0",
                "SEMICOLON ; null",
                "STRING \"hi\" hi",
                "NUMBER 1.5 1.5",
                "EOF  null",
            ]
        );
    }
}
