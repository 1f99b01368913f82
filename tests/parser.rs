#[cfg(test)]
mod parser_tests {
    use rox::ast_printer::AstPrinter;
    use rox::error::Diagnostics;
    use rox::expr::Expr;
    use rox::parser::{Parser, MAX_DEPTH};
    use rox::scanner::scan_tokens;
    use rox::stmt::Stmt;
    use rox::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        let mut diagnostics = Diagnostics::new();
        let tokens = scan_tokens(source, &mut diagnostics);
        assert!(diagnostics.is_empty(), "lex errors: {:?}", diagnostics);
        tokens
    }

    fn print_expr(source: &str) -> String {
        let tokens = tokens(source);
        let expr = Parser::new(&tokens)
            .parse_expression()
            .unwrap_or_else(|e| panic!("parse failed: {}", e));

        AstPrinter.print(&expr)
    }

    fn parse_program(source: &str) -> (Vec<Stmt>, Diagnostics) {
        let tokens = tokens(source);
        let mut diagnostics = Diagnostics::new();
        let statements = Parser::new(&tokens).parse(&mut diagnostics);
        (statements, diagnostics)
    }

    #[test]
    fn test_precedence_ladder() {
        assert_eq!(print_expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(print_expr("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
        assert_eq!(print_expr("-1 < 2 == !false"), "(== (< (- 1.0) 2.0) (! false))");
        assert_eq!(
            print_expr("a or b and c"),
            "(or a (and b c))"
        );
    }

    #[test]
    fn test_binary_operators_fold_left() {
        assert_eq!(print_expr("10 - 2 - 3"), "(- (- 10.0 2.0) 3.0)");
        assert_eq!(print_expr("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
        assert_eq!(print_expr("a or b or c"), "(or (or a b) c)");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(print_expr("a = b = 3"), "(= a (= b 3.0))");
        assert_eq!(print_expr("obj.field = 1"), "(= (. obj field) 1.0)");
    }

    #[test]
    fn test_calls_and_property_access() {
        assert_eq!(print_expr("f(1, 2)(3)"), "(call (call f 1.0 2.0) 3.0)");
        assert_eq!(print_expr("a.b.c()"), "(call (. (. a b) c))");
        assert_eq!(print_expr("super.method"), "(super method)");
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (statements, diagnostics) = parse_program("1 = 2;\nprint 3;");

        assert_eq!(
            diagnostics.static_errors,
            vec!["[line 1] Error at '=': Invalid assignment target.".to_string()]
        );
        // No resynchronisation: both statements survive.
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_missing_close_paren() {
        let tokens = tokens("(1 + 2");
        let err = Parser::new(&tokens).parse_expression().unwrap_err();

        assert_eq!(
            err.to_string(),
            "[line 1] Error at end: Expect ')' after expression."
        );
        assert!(err.is_static());
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.message(), "Expect ')' after expression.");
    }

    #[test]
    fn test_recovery_reports_every_error() {
        let source = "var = 1;\nprint ;\nvar ok = 1;\nprint ok;";
        let (statements, diagnostics) = parse_program(source);

        assert_eq!(
            diagnostics.static_errors,
            vec![
                "[line 1] Error at '=': Expect variable name.".to_string(),
                "[line 2] Error at ';': Expect expression.".to_string(),
            ]
        );
        assert_eq!(statements.len(), 2);
        assert!(matches!(&statements[0], Stmt::Var { name, .. } if name.lexeme == "ok"));
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        let (statements, diagnostics) =
            parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert!(diagnostics.is_empty());
        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block, got {:?}", statements[0]);
        };
        assert!(matches!(&outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected while, got {:?}", outer[1]);
        };
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected block body, got {:?}", body);
        };
        assert!(matches!(&inner[0], Stmt::Print(_)));
        assert!(matches!(&inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_class_declaration_with_superclass() {
        let (statements, diagnostics) =
            parse_program("class B < A { init(x) { this.x = x; } get() { return this.x; } }");

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected class, got {:?}", statements[0]);
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
        assert_eq!(names, vec!["init", "get"]);
        assert_eq!(methods[0].params.len(), 1);
    }

    #[test]
    fn test_identical_variables_get_distinct_ids() {
        let (statements, _) = parse_program("a; a;");

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => *id,
                other => panic!("unexpected {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_first_id_is_respected() {
        let tokens = tokens("x;");
        let mut parser = Parser::with_first_id(&tokens, 40);
        let statements = parser.parse(&mut Diagnostics::new());

        assert!(matches!(
            &statements[0],
            Stmt::Expression(Expr::Variable { id, .. }) if id.0 == 40
        ));
        assert_eq!(parser.next_id(), 41);
    }

    #[test]
    fn test_too_many_arguments_is_reported() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));
        let (statements, diagnostics) = parse_program(&source);

        assert_eq!(diagnostics.static_errors.len(), 1);
        assert!(diagnostics.static_errors[0].contains("Can't have more than 255 arguments."));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_trailing_tokens_after_expression() {
        let tokens = tokens("1 + 2 )");
        let err = Parser::new(&tokens).parse_expression().unwrap_err();

        assert_eq!(
            err.to_string(),
            "[line 1] Error at ')': Expect end of expression."
        );
    }

    fn deep_grouping(depth: usize) -> String {
        format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_nesting_is_bounded() {
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let shallow = tokens(&deep_grouping(100));
                assert!(Parser::new(&shallow).parse_expression().is_ok());

                let deep = tokens(&deep_grouping(MAX_DEPTH + 10));
                let err = Parser::new(&deep).parse_expression().unwrap_err();
                assert!(err.to_string().ends_with("Too much nesting."), "{}", err);

                let source = format!("print {};\nprint 1;", deep_grouping(MAX_DEPTH + 10));
                let (statements, diagnostics) = parse_program(&source);
                assert_eq!(diagnostics.static_errors.len(), 1);
                assert_eq!(statements.len(), 1);

                let blocks = format!("{}{}", "{".repeat(MAX_DEPTH + 10), "}".repeat(MAX_DEPTH + 10));
                let (_, diagnostics) = parse_program(&blocks);
                assert!(!diagnostics.is_empty());
            })
            .expect("spawn");

        handle.join().expect("nesting test panicked");
    }
}
