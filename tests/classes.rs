mod common;

#[cfg(test)]
mod class_tests {
    use super::common::{output_of, run};
    use rox::lox::Status;

    fn runtime_error(source: &str) -> String {
        let outcome = run(source);
        assert_eq!(outcome.status, Status::RuntimeError, "output: {}", outcome.output);
        outcome.diagnostics.runtime_errors.join("\n")
    }

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(
            output_of("class Bagel {} print Bagel; print Bagel();"),
            vec!["Bagel", "Bagel instance"]
        );
    }

    #[test]
    fn test_fields_are_per_instance() {
        let source = r#"
            class Box {}
            var a = Box();
            var b = Box();
            a.value = 1;
            b.value = 2;
            print a.value;
            print b.value;
            print a.value = 3;
        "#;

        assert_eq!(output_of(source), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_methods_see_this() {
        let source = r#"
            class Person {
              greet() { print "Hi, " + this.name; }
            }
            var p = Person();
            p.name = "Ada";
            p.greet();
        "#;

        assert_eq!(output_of(source), vec!["Hi, Ada"]);
    }

    #[test]
    fn test_bound_method_keeps_its_receiver() {
        let source = r#"
            class Counter {
              init() { this.count = 0; }
              bump() { this.count = this.count + 1; return this.count; }
            }
            var c = Counter();
            var bump = c.bump;
            bump();
            bump();
            print c.count;
            print bump;
        "#;

        assert_eq!(output_of(source), vec!["2", "<fn bump>"]);
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            print a.m();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(output_of(source), vec!["method", "field"]);
    }

    #[test]
    fn test_initializer_arguments_and_arity() {
        let source = r#"
            class Point {
              init(x, y) { this.x = x; this.y = y; }
            }
            var p = Point(1, 2);
            print p.x + p.y;
        "#;

        assert_eq!(output_of(source), vec!["3"]);
        assert_eq!(
            runtime_error("class Point { init(x, y) {} }\nPoint(1);"),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_error("class Empty {}\nEmpty(1);"),
            "Expected 0 arguments but got 1.\n[line 2]"
        );
    }

    #[test]
    fn test_initializer_returns_this() {
        let source = r#"
            class Foo {
              init() {
                this.ready = true;
                return;
              }
            }
            var foo = Foo();
            print foo.init() == foo;
            print foo.ready;
        "#;

        assert_eq!(output_of(source), vec!["true", "true"]);
    }

    #[test]
    fn test_inherited_methods() {
        let source = r#"
            class Doughnut {
              cook() { print "Fry until golden brown."; }
            }
            class BostonCream < Doughnut {}
            BostonCream().cook();
        "#;

        assert_eq!(output_of(source), vec!["Fry until golden brown."]);
    }

    #[test]
    fn test_super_calls_reach_the_superclass() {
        let source = r#"
            class A {
              method() { print "A method"; }
            }
            class B < A {
              method() { print "B method"; }
              test() { super.method(); }
            }
            class C < B {}
            C().test();
        "#;

        assert_eq!(output_of(source), vec!["A method"]);
    }

    #[test]
    fn test_super_binds_this() {
        let source = r#"
            class Base {
              init(name) { this.name = name; }
              describe() { return "I am " + this.name; }
            }
            class Derived < Base {
              init(name) { super.init(name + "!"); }
              describe() { return super.describe() + " (derived)"; }
            }
            print Derived("d").describe();
        "#;

        assert_eq!(output_of(source), vec!["I am d! (derived)"]);
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("class A {}\nprint A().missing;"),
            "Undefined property 'missing'.\n[line 2]"
        );
        assert_eq!(
            runtime_error("var n = 1;\nprint n.field;"),
            "Only instances have properties.\n[line 2]"
        );
        assert_eq!(
            runtime_error("var n = 1;\nn.field = 2;"),
            "Only instances have fields.\n[line 2]"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            runtime_error("var NotAClass = \"nope\";\nclass Sub < NotAClass {}"),
            "Superclass must be a class.\n[line 2]"
        );
    }

    #[test]
    fn test_instances_compare_by_identity() {
        let source = r#"
            class A {}
            var a = A();
            var b = A();
            print a == a;
            print a == b;
            print A == A;
        "#;

        assert_eq!(output_of(source), vec!["true", "false", "true"]);
    }
}
