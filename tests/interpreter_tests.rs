// End-to-end tests: whole programs run against captured input and output.

use std::io::Cursor;
use tinybasic::ast::Block;
use tinybasic::error::{BasicError, ErrorKind};
use tinybasic::interpreter::Interpreter;
use tinybasic::lexer::Lexer;
use tinybasic::parser::Parser;

fn parse_program(source: &str) -> Block {
    let lexer = Lexer::new(source, "<test>");
    let mut parser = Parser::new(lexer).expect("lexing the first token failed");
    parser.parse().expect("program failed to parse")
}

/// Run `source` feeding it `input` for INPUT statements; return the
/// execution result together with everything the program wrote.
fn execute(source: &str, input: &str) -> (Result<(), BasicError>, String) {
    let program = parse_program(source);
    let mut output = Vec::new();
    let result = {
        let mut interpreter = Interpreter::with_io(
            &program,
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(&mut output),
        );
        interpreter.run()
    };
    (result, String::from_utf8(output).expect("output is not UTF-8"))
}

fn output_of(source: &str) -> String {
    let (result, output) = execute(source, "");
    if let Err(error) = result {
        panic!("program failed: {} (output so far: {:?})", error, output);
    }
    output
}

fn runtime_error_of(source: &str) -> (BasicError, String) {
    let (result, output) = execute(source, "");
    match result {
        Err(error) => {
            assert_eq!(error.kind, ErrorKind::Runtime);
            (error, output)
        }
        Ok(()) => panic!("program unexpectedly succeeded; output: {:?}", output),
    }
}

// ----- basic statements -----

#[test]
fn prints_a_string() {
    assert_eq!(output_of("PRINT \"hello\""), "hello\n");
}

#[test]
fn print_without_arguments_prints_a_blank_line() {
    assert_eq!(output_of("PRINT"), "\n");
}

#[test]
fn print_list_has_no_separators() {
    assert_eq!(output_of("PRINT 1, \"x\", 2"), "1x2\n");
}

#[test]
fn empty_program_runs_to_completion() {
    assert_eq!(output_of(""), "");
}

#[test]
fn keywords_and_identifiers_are_case_insensitive() {
    assert_eq!(output_of("LeT Foo = 41\npRiNt FOO + 1"), "42\n");
}

// ----- arithmetic and the number model -----

#[test]
fn integer_arithmetic_stays_integral() {
    assert_eq!(output_of("PRINT 1+2\nPRINT 1/2\nPRINT 4/2\n"), "3\n0.5\n2\n");
}

#[test]
fn floats_always_show_a_decimal_point() {
    assert_eq!(output_of("PRINT 2.5 + 2.5\nPRINT 1.25"), "5.0\n1.25\n");
}

#[test]
fn float_literals_with_a_leading_zero_survive_normalization() {
    // The lexer strips leading zeros, so 0.5 reaches the parser as ".5".
    assert_eq!(output_of("PRINT 0.5"), "0.5\n");
}

#[test]
fn mixed_arithmetic_demotes_to_float() {
    assert_eq!(output_of("PRINT 1 + 0.5"), "1.5\n");
}

#[test]
fn subtraction_associates_to_the_right() {
    // 10 - (5 - 2), a quirk of the right-recursive grammar.
    assert_eq!(output_of("PRINT 10 - 5 - 2"), "7\n");
}

#[test]
fn modulo_works_on_integers() {
    assert_eq!(output_of("PRINT 7 MOD 3"), "1\n");
}

#[test]
fn relational_operators_yield_one_or_zero() {
    assert_eq!(
        output_of("PRINT 2 > 1\nPRINT 1 <> 1\nPRINT 2 <= 2\nPRINT 1 = 2"),
        "1\n0\n1\n0\n"
    );
}

#[test]
fn boolean_operators_use_truthiness() {
    assert_eq!(
        output_of("PRINT 1 AND 0\nPRINT 1 OR 0\nPRINT NOT 1\nPRINT NOT 0"),
        "0\n1\n0\n1\n"
    );
}

#[test]
fn boolean_operators_short_circuit() {
    // The right-hand side would divide by zero if it were evaluated.
    assert_eq!(output_of("PRINT 0 AND 1/0\nPRINT 1 OR 1/0"), "0\n1\n");
}

// ----- variables and scope -----

#[test]
fn let_binds_and_print_reads_back() {
    assert_eq!(output_of("LET X = 6 * 7\nPRINT X"), "42\n");
}

#[test]
fn numeric_and_string_namespaces_are_disjoint() {
    assert_eq!(
        output_of("LET X = 1\nLET X$ = \"s\"\nPRINT X\nPRINT X$"),
        "1\ns\n"
    );
}

#[test]
fn string_concatenation_and_variables() {
    assert_eq!(
        output_of("LET N$ = \"world\"\nPRINT \"hello \" & N$\n"),
        "hello world\n"
    );
}

#[test]
fn assignment_updates_the_innermost_existing_binding() {
    let source = "LET X = 1\nIF 1 THEN\nLET X = 2\nEND IF\nPRINT X";
    assert_eq!(output_of(source), "2\n");
}

#[test]
fn inner_scopes_see_outer_variables() {
    let source = "LET X = 1\nIF 1 THEN\nLET Y = 2\nPRINT X + Y\nEND IF\nPRINT X";
    assert_eq!(output_of(source), "3\n1\n");
}

#[test]
fn block_local_variables_die_with_their_frame() {
    let source = "IF 1 THEN\nLET Y = 2\nEND IF\nPRINT Y";
    let (error, _) = runtime_error_of(source);
    assert_eq!(error.message, "Variable y undefined");
}

#[test]
fn reading_an_unset_variable_fails() {
    let (error, _) = runtime_error_of("PRINT X");
    assert_eq!(error.message, "Variable x undefined");
}

// ----- control flow -----

#[test]
fn for_loop_counts_up() {
    assert_eq!(output_of("FOR I = 1 TO 3\nPRINT I\nNEXT I\n"), "1\n2\n3\n");
}

#[test]
fn for_loop_with_negative_step_counts_down() {
    assert_eq!(
        output_of("FOR I = 3 TO 1 STEP -1\nPRINT I\nNEXT I"),
        "3\n2\n1\n"
    );
}

#[test]
fn for_loop_with_step_skips() {
    assert_eq!(
        output_of("FOR I = 1 TO 10 STEP 4\nPRINT I\nNEXT I"),
        "1\n5\n9\n"
    );
}

#[test]
fn for_loop_runs_zero_times_when_already_past_the_limit() {
    assert_eq!(
        output_of("FOR I = 5 TO 1\nPRINT I\nNEXT I\nPRINT \"done\""),
        "done\n"
    );
}

#[test]
fn for_bounds_are_frozen_at_entry() {
    // Reassigning the limit variable inside the body must not extend the loop.
    let source = "LET N = 3\nFOR I = 1 TO N\nLET N = 100\nPRINT I\nNEXT I";
    assert_eq!(output_of(source), "1\n2\n3\n");
}

#[test]
fn do_while_loops_until_condition_fails() {
    let source = "LET X = 0\nDO WHILE X < 3\nLET X = X + 1\nLOOP\nPRINT X";
    assert_eq!(output_of(source), "3\n");
}

#[test]
fn do_while_with_false_condition_never_runs() {
    assert_eq!(output_of("DO WHILE 0\nPRINT \"no\"\nLOOP\nPRINT \"yes\""), "yes\n");
}

#[test]
fn exit_do_leaves_the_loop() {
    let source = "LET X = 0\nDO WHILE 1\nLET X = X+1\nIF X >= 3 THEN EXIT DO\nLOOP\nPRINT X\n";
    assert_eq!(output_of(source), "3\n");
}

#[test]
fn exit_for_leaves_the_loop() {
    let source = "FOR I = 1 TO 10\nIF I = 3 THEN EXIT FOR\nPRINT I\nNEXT I\nPRINT \"out\"";
    assert_eq!(output_of(source), "1\n2\nout\n");
}

#[test]
fn if_block_takes_the_first_true_branch() {
    let source = "LET A = 2\nIF A = 1 THEN\nPRINT \"one\"\nELSEIF A = 2 THEN\nPRINT \"two\"\nELSE\nPRINT \"other\"\nEND IF\n";
    assert_eq!(output_of(source), "two\n");
}

#[test]
fn if_block_falls_through_to_else() {
    let source = "LET A = 9\nIF A = 1 THEN\nPRINT \"one\"\nELSEIF A = 2 THEN\nPRINT \"two\"\nELSE\nPRINT \"other\"\nEND IF\n";
    assert_eq!(output_of(source), "other\n");
}

#[test]
fn if_block_without_else_can_skip_everything() {
    assert_eq!(output_of("IF 0 THEN\nPRINT \"no\"\nEND IF\nPRINT \"after\""), "after\n");
}

#[test]
fn goto_jumps_over_statements() {
    let source = "10 PRINT \"a\"\nGOTO 30\n20 PRINT \"b\"\n30 PRINT \"c\"\n";
    assert_eq!(output_of(source), "a\nc\n");
}

#[test]
fn goto_unwinds_out_of_loops() {
    let source = "FOR I = 1 TO 10\nGOTO 99\nNEXT I\n99 PRINT \"escaped\"";
    assert_eq!(output_of(source), "escaped\n");
}

#[test]
fn if_goto_with_word_label_loops() {
    let source = "LET I = 0\nagain: LET I = I + 1\nIF I < 3 THEN again\nPRINT I";
    assert_eq!(output_of(source), "3\n");
}

#[test]
fn if_goto_else_branch() {
    let source = "IF 0 THEN 10 ELSE 20\n10 PRINT \"then\"\nGOTO 30\n20 PRINT \"else\"\n30 PRINT \"end\"";
    assert_eq!(output_of(source), "else\nend\n");
}

#[test]
fn stop_halts_execution() {
    assert_eq!(output_of("PRINT \"a\"\nSTOP\nPRINT \"b\""), "a\n");
}

#[test]
fn stop_halts_from_inside_a_loop() {
    assert_eq!(output_of("DO WHILE 1\nSTOP\nLOOP\nPRINT \"x\""), "");
}

#[test]
fn comments_are_ignored() {
    assert_eq!(output_of("REM an introduction\nPRINT 1\nrem the end"), "1\n");
}

#[test]
fn labels_survive_blank_lines() {
    assert_eq!(output_of("GOTO fin\nPRINT \"skipped\"\nfin:\n\nPRINT \"done\""), "done\n");
}

// ----- INPUT -----

#[test]
fn input_reads_an_integer() {
    let (result, output) = execute("INPUT X\nPRINT X + 1", "41\n");
    assert!(result.is_ok(), "program failed: {:?}", result);
    assert_eq!(output, "? 42\n");
}

#[test]
fn input_reads_one_line_per_statement() {
    let (result, output) = execute("INPUT A\nINPUT B\nPRINT A + B", "1\n2\n");
    assert!(result.is_ok(), "program failed: {:?}", result);
    assert_eq!(output, "? ? 3\n");
}

#[test]
fn input_rejects_non_integers() {
    let (result, output) = execute("INPUT X", "not a number\n");
    let error = result.expect_err("INPUT should have failed");
    assert_eq!(error.kind, ErrorKind::Runtime);
    assert_eq!(error.message, "User input error: expected an integer");
    assert_eq!(output, "? ");
}

#[test]
fn input_rejects_floats() {
    let (result, _) = execute("INPUT X", "1.5\n");
    assert!(result.is_err());
}

// ----- runtime errors -----

#[test]
fn division_by_zero_stops_the_program() {
    let (error, output) = runtime_error_of("PRINT 1/0\nPRINT \"answer\"\n");
    assert_eq!(error.message, "Division by zero");
    assert_eq!(error.to_string(), "Runtime error: Division by zero");
    assert_eq!(output, "", "nothing may be printed after the failure");
}

#[test]
fn modulo_of_floats_fails() {
    let (error, _) = runtime_error_of("PRINT 7.5 MOD 2");
    assert_eq!(error.message, "Modulo is only defined on whole number types");
}

#[test]
fn jump_to_missing_label_fails() {
    let (error, _) = runtime_error_of("GOTO 99");
    assert_eq!(error.message, "Jump to undefined label 99");
}

#[test]
fn exit_without_enclosing_block_fails() {
    let (error, _) = runtime_error_of("EXIT DO");
    assert_eq!(error.message, "Cannot EXIT do: no such block");
}

#[test]
fn exit_with_wrong_name_unwinds_to_failure() {
    let (error, _) = runtime_error_of("DO WHILE 1\nEXIT FOR\nLOOP");
    assert_eq!(error.message, "Cannot EXIT for: no such block");
}
