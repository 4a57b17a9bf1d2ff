//! Parses a compiler-input datum into a
//! typed [`Form`] the resolver recurses over.
//!
//! This is the one place raw `Object` pair-cells are walked structurally;
//! every later pass (resolver, compiler) works over a typed Rust AST, the
//! way the prior `seen_parser::Expr`/`checker::TypeChecker` pair works,
//! rather than re-deriving shape on every pass by re-walking cons cells.

use threeimp_common::{Span, ThreeImpError};
use threeimp_intern::SymbolId;
use threeimp_value::{car, cdr, strip_syntax, syntax_span, to_vec, Object};

/// A macro-expanded source form, one level up from the raw `Object` datum
/// it was parsed from. There is no macro expander -- every keyword here
/// is recognized structurally, never rewritten.
#[derive(Debug, Clone)]
pub enum Form {
    Const(Object),
    Symbol(SymbolId),
    Quote(Object),
    If(Box<Form>, Box<Form>, Box<Form>),
    Set(SymbolId, Box<Form>),
    Lambda(Vec<SymbolId>, Box<Form>),
    Begin(Vec<Form>),
    CallCc(Box<Form>),
    Define(SymbolId, Box<Form>),
    PInvoke(SymbolId, Vec<Form>),
    App(Box<Form>, Vec<Form>),
}

fn list_or_err(obj: Object, what: &str, span: Option<Span>) -> Result<Vec<Object>, ThreeImpError> {
    if !obj.is_pair() && !obj.is_null() {
        return Err(ThreeImpError::compile(format!("{what}: expected a list"), span));
    }
    Ok(to_vec(obj))
}

/// Parse one datum into a `Form`. `span` tracks the nearest enclosing
/// `Syntax` wrapper seen so far, for error messages on forms the parser
/// strips down to plain data before recursing further.
pub fn parse(datum: Object) -> Result<Form, ThreeImpError> {
    parse_spanned(datum, None)
}

fn parse_spanned(datum: Object, outer_span: Option<Span>) -> Result<Form, ThreeImpError> {
    let span = if datum.is_syntax() { Some(syntax_span(datum)) } else { outer_span };
    let datum = strip_syntax(datum);

    if let Some(id) = datum.as_symbol() {
        return Ok(Form::Symbol(id));
    }
    if !datum.is_pair() {
        return Ok(Form::Const(datum));
    }

    let head = strip_syntax(car(datum));
    let tail = cdr(datum);
    let wk = threeimp_intern::well_known();

    if let Some(kw) = head.as_symbol() {
        if kw == wk.quote {
            let args = list_or_err(tail, "quote", span)?;
            if args.len() != 1 {
                return Err(ThreeImpError::compile("quote: expected exactly 1 argument", span));
            }
            return Ok(Form::Quote(strip_syntax(args[0])));
        }
        if kw == wk.lambda {
            let args = list_or_err(tail, "lambda", span)?;
            if args.len() < 2 {
                return Err(ThreeImpError::compile("lambda: expected (lambda (vars...) body...)", span));
            }
            let formals = list_or_err(strip_syntax(args[0]), "lambda formals", span)?
                .into_iter()
                .map(|o| {
                    strip_syntax(o).as_symbol().ok_or_else(|| {
                        ThreeImpError::compile("lambda: non-symbol in formal-parameter position", span)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let body = parse_begin(&args[1..], span)?;
            return Ok(Form::Lambda(formals, Box::new(body)));
        }
        if kw == wk.if_ {
            let args = list_or_err(tail, "if", span)?;
            if args.len() != 3 {
                return Err(ThreeImpError::compile("if: expected (if cond then else)", span));
            }
            return Ok(Form::If(
                Box::new(parse_spanned(args[0], span)?),
                Box::new(parse_spanned(args[1], span)?),
                Box::new(parse_spanned(args[2], span)?),
            ));
        }
        if kw == wk.set {
            let args = list_or_err(tail, "set!", span)?;
            if args.len() != 2 {
                return Err(ThreeImpError::compile("set!: expected (set! var val)", span));
            }
            let var = strip_syntax(args[0])
                .as_symbol()
                .ok_or_else(|| ThreeImpError::compile("set!: first argument must be a symbol", span))?;
            return Ok(Form::Set(var, Box::new(parse_spanned(args[1], span)?)));
        }
        if kw == wk.call_cc {
            let args = list_or_err(tail, "call/cc", span)?;
            if args.len() != 1 {
                return Err(ThreeImpError::compile("call/cc: expected exactly 1 argument", span));
            }
            return Ok(Form::CallCc(Box::new(parse_spanned(args[0], span)?)));
        }
        if kw == wk.define {
            let args = list_or_err(tail, "define", span)?;
            if args.len() != 2 {
                return Err(ThreeImpError::compile("define: expected (define name value)", span));
            }
            let name = strip_syntax(args[0])
                .as_symbol()
                .ok_or_else(|| ThreeImpError::compile("define: first argument must be a symbol", span))?;
            return Ok(Form::Define(name, Box::new(parse_spanned(args[1], span)?)));
        }
        if kw == wk.begin {
            let args = list_or_err(tail, "begin", span)?;
            return parse_begin(&args, span);
        }
        if kw == wk.p_invoke {
            let args = list_or_err(tail, "p/invoke", span)?;
            if args.is_empty() {
                return Err(ThreeImpError::compile("p/invoke: expected a procedure name", span));
            }
            let name = strip_syntax(args[0])
                .as_symbol()
                .ok_or_else(|| ThreeImpError::compile("p/invoke: first argument must be a symbol", span))?;
            let rest = args[1..]
                .iter()
                .map(|&o| parse_spanned(o, span))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Form::PInvoke(name, rest));
        }
    }

    // Application: `head` evaluated as an expression too (may itself be a
    // lambda -- an IIFE -- not necessarily a symbol).
    let fun = parse_spanned(car(datum), span)?;
    let args = list_or_err(tail, "application", span)?
        .into_iter()
        .map(|o| parse_spanned(o, span))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Form::App(Box::new(fun), args))
}

fn parse_begin(forms: &[Object], span: Option<Span>) -> Result<Form, ThreeImpError> {
    if forms.is_empty() {
        return Err(ThreeImpError::compile("begin: expected at least one expression form to evaluate, got 0", span));
    }
    let parsed = forms.iter().map(|&o| parse_spanned(o, span)).collect::<Result<Vec<_>, _>>()?;
    if parsed.len() == 1 {
        Ok(parsed.into_iter().next().unwrap())
    } else {
        Ok(Form::Begin(parsed))
    }
}
