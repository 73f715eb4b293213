//! The concrete LB grammar.
//!
//! LB is a small instruction-oriented IR: typed declarations, labeled basic
//! blocks, array/tuple primitives, and control-flow instructions. The rule
//! graph below only recognizes shape; scoping, typing, and label resolution
//! belong to later compiler phases working on the parse tree.
//!
//! The instruction rule is one ordered choice over every instruction form,
//! and the listed order is the tie-break for shared prefixes: forms that
//! extend a shorter form (a call with assignment extends a plain
//! assignment) must come first, and plain assignment is the most general
//! fallback, listed last. Reorder at your peril.

use once_cell::sync::Lazy;

use super::{Grammar, RuleId};

/// The LB rule graph plus handles to every rule later phases care about.
///
/// Built once behind [`LB`]; the grammar is immutable and shared read-only
/// afterwards.
pub struct LbGrammar {
    pub grammar: Grammar,

    // Sub-grammars.
    pub name: RuleId,
    pub label: RuleId,
    pub number: RuleId,
    pub comparison: RuleId,
    pub operator: RuleId,
    /// A name or a number: an operand left untyped until later phases.
    pub operand: RuleId,
    pub ty: RuleId,
    pub voidable_type: RuleId,
    pub args: RuleId,
    pub names: RuleId,
    pub condition: RuleId,
    pub array_access: RuleId,

    // Instruction forms, in choice order.
    pub call: RuleId,
    pub call_assign: RuleId,
    pub type_decl: RuleId,
    pub op_assign: RuleId,
    pub label_mark: RuleId,
    pub if_stmt: RuleId,
    pub goto_stmt: RuleId,
    pub ret: RuleId,
    pub while_stmt: RuleId,
    pub cont: RuleId,
    pub brk: RuleId,
    pub array_load: RuleId,
    pub array_store: RuleId,
    pub length: RuleId,
    pub new_array: RuleId,
    pub new_tuple: RuleId,
    pub scope: RuleId,
    pub assign: RuleId,

    // Structure.
    pub instruction: RuleId,
    pub function: RuleId,
    pub program: RuleId,
}

/// The one LB grammar instance. Constructing the rule graph is cheap but
/// there is no reason to do it more than once.
pub static LB: Lazy<LbGrammar> = Lazy::new(LbGrammar::build);

impl LbGrammar {
    fn build() -> Self {
        let mut g = Grammar::new();

        // Whitespace, line separators, comments.
        let space = g.one_of(" \t");
        let spaces = g.star(space);
        let eol = g.eol();
        let slashes = g.literal("//");
        let to_line_end = g.rest_of_line();
        let comment = g.seq(&[slashes, to_line_end]);
        let eol_or_comment = g.choice(&[eol, comment]);
        let separator_line = g.seq(&[spaces, eol_or_comment]);
        let line_seps = g.star(separator_line);
        let space_or_eol = g.choice(&[space, eol]);
        let spaces_or_newlines = g.star(space_or_eol);

        // Shared tokens.
        let lparen = g.literal("(");
        let rparen = g.literal(")");
        let lbracket = g.literal("[");
        let rbracket = g.literal("]");
        let lbrace = g.literal("{");
        let rbrace = g.literal("}");
        let comma = g.literal(",");
        let colon = g.literal(":");
        let arrow = g.literal("<-");

        // Names, labels, numbers.
        let ident = g.identifier();
        let name = g.capture(ident, "name");
        let label_body = g.seq(&[colon, name]);
        let label = g.capture(label_body, "label");

        let sign = g.one_of("-+");
        let opt_sign = g.opt(sign);
        let nonzero = g.range('1', '9');
        let digit = g.range('0', '9');
        let digits = g.star(digit);
        let signed = g.seq(&[opt_sign, nonzero, digits]);
        let zero = g.literal("0");
        let number_body = g.choice(&[signed, zero]);
        let number = g.capture(number_body, "number");

        // Operators. Two-character forms come before their one-character
        // prefixes so ordered choice cannot truncate them.
        let le = g.literal("<=");
        let ge = g.literal(">=");
        let eq = g.literal("=");
        let lt = g.literal("<");
        let gt = g.literal(">");
        let comparison_body = g.choice(&[le, ge, eq, lt, gt]);
        let comparison = g.capture(comparison_body, "comparison");

        let shl = g.literal("<<");
        let shr = g.literal(">>");
        let plus_op = g.literal("+");
        let minus_op = g.literal("-");
        let star_op = g.literal("*");
        let and_op = g.literal("&");
        let operator_body = g.choice(&[shl, shr, plus_op, minus_op, star_op, and_op, comparison]);
        let operator = g.capture(operator_body, "operator");

        let operand_body = g.choice(&[name, number]);
        let operand = g.capture(operand_body, "operand");
        let opt_operand = g.opt(operand);

        // Types.
        let int64 = g.literal("int64");
        let brackets = g.literal("[]");
        let array_suffix = g.star(brackets);
        let int64_ty = g.seq(&[int64, array_suffix]);
        let tuple_ty = g.literal("tuple");
        let code_ty = g.literal("code");
        let ty_body = g.choice(&[int64_ty, tuple_ty, code_ty]);
        let ty = g.capture(ty_body, "type");
        let void_ty = g.literal("void");
        let voidable_body = g.choice(&[ty, void_ty]);
        let voidable_type = g.capture(voidable_body, "voidable-type");

        // Argument list: comma-separated operands, commas may be padded.
        let padded_comma = g.seq(&[spaces, comma, spaces]);
        let args_list = g.separated(operand, padded_comma);
        let args_body = g.opt(args_list);
        let args = g.capture(args_body, "args");

        // Comma-separated name list for type declarations.
        let names_tail = g.seq(&[comma, spaces, name]);
        let names_tails = g.star(names_tail);
        let names_body = g.seq(&[spaces, name, names_tails]);
        let names = g.capture(names_body, "names");

        // Conditions and array subscripts.
        let condition_body = g.interleaved(spaces, &[operand, comparison, operand]);
        let condition = g.capture(condition_body, "condition");

        let subscript = g.interleaved(spaces, &[lbracket, operand, rbracket]);
        let array_access_body = g.plus(subscript);
        let array_access = g.capture(array_access_body, "array-access");

        // Keywords.
        let kw_if = g.literal("if");
        let kw_goto = g.literal("goto");
        let kw_return = g.literal("return");
        let kw_while = g.literal("while");
        let kw_continue = g.literal("continue");
        let kw_break = g.literal("break");
        let kw_length = g.literal("length");
        let kw_new = g.literal("new");
        let kw_array = g.literal("Array");
        let kw_tuple = g.literal("Tuple");

        // Instruction forms.
        let call_body = g.interleaved(spaces, &[name, lparen, args, rparen]);
        let call = g.capture(call_body, "call");

        let call_assign_body =
            g.interleaved(spaces, &[name, arrow, name, lparen, args, rparen]);
        let call_assign = g.capture(call_assign_body, "call-assign");

        let type_decl_body = g.interleaved(spaces, &[voidable_type, names]);
        let type_decl = g.capture(type_decl_body, "type-decl");

        let op_assign_body =
            g.interleaved(spaces, &[name, arrow, operand, operator, operand]);
        let op_assign = g.capture(op_assign_body, "op-assign");

        let label_mark_body = g.seq(&[spaces, label]);
        let label_mark = g.capture(label_mark_body, "label-mark");

        let if_body =
            g.interleaved(spaces, &[kw_if, lparen, condition, rparen, label, label]);
        let if_stmt = g.capture(if_body, "if");

        let goto_body = g.interleaved(spaces, &[kw_goto, label]);
        let goto_stmt = g.capture(goto_body, "goto");

        let ret_body = g.interleaved(spaces, &[kw_return, opt_operand]);
        let ret = g.capture(ret_body, "return");

        let while_body =
            g.interleaved(spaces, &[kw_while, lparen, condition, rparen, label, label]);
        let while_stmt = g.capture(while_body, "while");

        let cont_body = g.seq(&[spaces, kw_continue]);
        let cont = g.capture(cont_body, "continue");

        let brk_body = g.seq(&[spaces, kw_break]);
        let brk = g.capture(brk_body, "break");

        let array_load_body = g.interleaved(spaces, &[name, arrow, name, array_access]);
        let array_load = g.capture(array_load_body, "array-load");

        let array_store_body =
            g.interleaved(spaces, &[name, array_access, arrow, operand]);
        let array_store = g.capture(array_store_body, "array-store");

        let length_body =
            g.interleaved(spaces, &[name, arrow, kw_length, name, opt_operand]);
        let length = g.capture(length_body, "length");

        let new_array_body = g.interleaved(
            spaces,
            &[name, arrow, kw_new, kw_array, lparen, args, rparen],
        );
        let new_array = g.capture(new_array_body, "new-array");

        let new_tuple_body = g.interleaved(
            spaces,
            &[name, arrow, kw_new, kw_tuple, lparen, operand, rparen],
        );
        let new_tuple = g.capture(new_tuple_body, "new-tuple");

        let assign_body = g.interleaved(spaces, &[name, arrow, operand]);
        let assign = g.capture(assign_body, "assign");

        // Instruction scope is mutually recursive with the instruction
        // choice, so it goes through a placeholder.
        let instruction = g.placeholder();
        g.name(instruction, "instruction");

        let instruction_line = g.seq(&[line_seps, spaces, instruction, line_seps]);
        let instruction_lines = g.star(instruction_line);
        let scope_body =
            g.interleaved(spaces_or_newlines, &[lbrace, instruction_lines, rbrace]);
        let scope = g.capture(scope_body, "scope");

        let instruction_body = g.choice(&[
            call,
            call_assign,
            type_decl,
            op_assign,
            label_mark,
            if_stmt,
            goto_stmt,
            ret,
            while_stmt,
            cont,
            brk,
            array_load,
            array_store,
            length,
            new_array,
            new_tuple,
            scope,
            assign,
        ]);
        g.fill(instruction, instruction_body);

        // Functions and the whole program.
        let param = g.interleaved(spaces, &[ty, name]);
        let param_list = g.separated(param, padded_comma);
        let params = g.opt(param_list);
        let function_body = g.interleaved(
            spaces,
            &[voidable_type, name, lparen, params, rparen, scope],
        );
        let function = g.capture(function_body, "function");

        let eof = g.eof();
        let function_item = g.seq(&[spaces, function]);
        let function_tail = g.seq(&[line_seps, function_item]);
        let function_tails = g.star(function_tail);
        let function_list = g.seq(&[function_item, function_tails]);
        let program_body = g.seq(&[line_seps, spaces, function_list, line_seps, spaces, eof]);
        let program = g.capture(program_body, "program");

        Self {
            grammar: g,
            name,
            label,
            number,
            comparison,
            operator,
            operand,
            ty,
            voidable_type,
            args,
            names,
            condition,
            array_access,
            call,
            call_assign,
            type_decl,
            op_assign,
            label_mark,
            if_stmt,
            goto_stmt,
            ret,
            while_stmt,
            cont,
            brk,
            array_load,
            array_store,
            length,
            new_array,
            new_tuple,
            scope,
            assign,
            instruction,
            function,
            program,
        }
    }
}
