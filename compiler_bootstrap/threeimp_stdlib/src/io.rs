//! `display`/`displayln`.
//! Grounded on `ss-core/std.cc`'s `bind_standard_console_io_procedures` and
//! `ss-core/printing.cc`'s `print_obj` (reimplemented here against this
//! crate's `Object` accessors rather than carried over verbatim).

use std::fmt::Write as _;

use threeimp_common::ThreeImpError;
use threeimp_intern::name as symbol_name;
use threeimp_memory::Heap;
use threeimp_value::{car, cdr, closure_entry, string_value, vector_slots, Object};
use threeimp_vcode::{GlobalTable, PlatformProcTable, VCode};

use crate::bind::bind_fixed;

fn write_string_escaped(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('"');
}

/// Render `obj` the way `display` does: strings unquoted-escaped lists,
/// booleans as `#t`/`#f`, pairs as `(a b . c)`-style s-expressions.
pub fn write_object(out: &mut String, obj: Object) {
    if obj.is_null() {
        out.push_str("()");
    } else if let Some(b) = obj.as_boolean() {
        out.push_str(if b { "#t" } else { "#f" });
    } else if let Some(n) = obj.as_integer() {
        let _ = write!(out, "{n}");
    } else if let Some(f) = obj.as_float32() {
        let _ = write!(out, "{f}");
    } else if obj.is_float64() {
        let _ = write!(out, "{}", obj.to_double().unwrap());
    } else if let Some(sym) = obj.as_symbol() {
        out.push_str(&symbol_name(sym));
    } else if obj.is_string() {
        write_string_escaped(out, string_value(obj));
    } else if obj.is_pair() {
        out.push('(');
        write_object(out, car(obj));
        let mut rest = cdr(obj);
        while rest.is_pair() {
            out.push(' ');
            write_object(out, car(rest));
            rest = cdr(rest);
        }
        if !rest.is_null() {
            out.push_str(" . ");
            write_object(out, rest);
        }
        out.push(')');
    } else if obj.is_closure() {
        let _ = write!(out, "#<procedure:{}>", closure_entry(obj));
    } else if obj.is_vector() {
        out.push_str("#(");
        for (i, &slot) in vector_slots(obj).iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            write_object(out, slot);
        }
        out.push(')');
    } else if obj.is_eof() {
        out.push_str("#<eof>");
    } else if obj.is_undef() {
        out.push_str("#<undefined>");
    } else {
        out.push_str("#<unprintable>");
    }
}

pub(crate) fn bind(heap: &Heap, code: &mut VCode, globals: &mut GlobalTable, procs: &mut PlatformProcTable) -> Result<(), ThreeImpError> {
    bind_fixed(heap, code, globals, procs, "display", &["it"], "writes a value to standard output", Box::new(|args, _heap| {
        let mut buf = String::new();
        write_object(&mut buf, args.get(0)?);
        print!("{buf}");
        Ok(Object::UNDEFINED)
    }))?;
    bind_fixed(heap, code, globals, procs, "displayln", &["it"], "writes a value to standard output, followed by a newline", Box::new(|args, _heap| {
        let mut buf = String::new();
        write_object(&mut buf, args.get(0)?);
        println!("{buf}");
        Ok(Object::UNDEFINED)
    }))?;
    bind_fixed(heap, code, globals, procs, "newline", &[], "writes a newline to standard output", Box::new(|_args, _heap| {
        println!();
        Ok(Object::UNDEFINED)
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_print_as_s_expressions() {
        let heap = Heap::new(64);
        let list = threeimp_value::list(&heap, &[Object::integer(1).unwrap(), Object::integer(2).unwrap()]).unwrap();
        let mut buf = String::new();
        write_object(&mut buf, list);
        assert_eq!(buf, "(1 2)");
    }

    #[test]
    fn improper_lists_print_with_a_dot() {
        let heap = Heap::new(64);
        let pair = threeimp_value::cons(&heap, Object::integer(1).unwrap(), Object::integer(2).unwrap()).unwrap();
        let mut buf = String::new();
        write_object(&mut buf, pair);
        assert_eq!(buf, "(1 . 2)");
    }

    #[test]
    fn strings_print_quoted_and_escaped() {
        let heap = Heap::new(64);
        let s = threeimp_value::make_string(&heap, "a\nb").unwrap();
        let mut buf = String::new();
        write_object(&mut buf, s);
        assert_eq!(buf, "\"a\\nb\"");
    }
}
