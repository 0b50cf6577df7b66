//! I/O operations: read, write, file-open, file-close, file-read, file-write
//!
//! `read`/`write` operate on stdin/stdout directly; `file-open` returns an
//! opaque `Value::Port` wrapping a `std::fs::File`, closed by `file-close`
//! and read/written whole in one call by `file-read`/`file-write`. Every
//! failure here — a missing file, a read against a closed port — surfaces as
//! `EvalError::IOError`.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::rc::Rc;

/// `(read)` — one character from stdin, or Nil at end of input.
pub fn builtin_read(args: &[Value]) -> Result<Value, EvalError> {
    if !args.is_empty() {
        return Err(EvalError::arity_error("read", "0", args.len()));
    }
    let mut byte = [0u8; 1];
    match std::io::stdin().read(&mut byte) {
        Ok(0) => Ok(Value::Nil),
        Ok(_) => Ok(Value::Str((byte[0] as char).to_string())),
        Err(e) => Err(EvalError::IOError(e.to_string())),
    }
}

/// `(write v)` — prints `v`'s display form to stdout without a newline.
pub fn builtin_write(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => {
            print!("{}", v);
            Ok(Value::Nil)
        }
        _ => Err(EvalError::arity_error("write", "1", args.len())),
    }
}

fn mode_str(v: &Value) -> Result<&str, EvalError> {
    match v {
        Value::Symbol(s) | Value::Str(s) => Ok(s.as_str()),
        other => Err(EvalError::type_error("file-open", "symbol or string", &other.type_name())),
    }
}

/// `(file-open path mode)` — `mode` is `r` or `w` (symbol or string).
pub fn builtin_file_open(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [Value::Str(path), mode] => {
            let file = match mode_str(mode)? {
                "r" => File::open(path),
                "w" => OpenOptions::new().write(true).create(true).truncate(true).open(path),
                other => return Err(EvalError::ValueError(format!("file-open: unknown mode {:?}, expected r or w", other))),
            }
            .map_err(|e| EvalError::IOError(e.to_string()))?;
            Ok(Value::Port(Rc::new(RefCell::new(Some(file)))))
        }
        [other, _] => Err(EvalError::type_error("file-open", "string path", &other.type_name())),
        _ => Err(EvalError::arity_error("file-open", "2", args.len())),
    }
}

fn as_port(function: &str, v: &Value) -> Result<Rc<RefCell<Option<File>>>, EvalError> {
    match v {
        Value::Port(cell) => Ok(cell.clone()),
        other => Err(EvalError::type_error(function, "port", &other.type_name())),
    }
}

/// `(file-close port)` — drops the underlying file handle.
pub fn builtin_file_close(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => {
            let port = as_port("file-close", v)?;
            *port.borrow_mut() = None;
            Ok(Value::Nil)
        }
        _ => Err(EvalError::arity_error("file-close", "1", args.len())),
    }
}

/// `(file-read port)` — the entire remaining contents as a string.
pub fn builtin_file_read(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => {
            let port = as_port("file-read", v)?;
            let mut borrow = port.borrow_mut();
            let file = borrow
                .as_mut()
                .ok_or_else(|| EvalError::IOError("file-read: port is closed".to_string()))?;
            let mut contents = String::new();
            file.read_to_string(&mut contents).map_err(|e| EvalError::IOError(e.to_string()))?;
            Ok(Value::Str(contents))
        }
        _ => Err(EvalError::arity_error("file-read", "1", args.len())),
    }
}

/// `(file-write port string)` — appends `string` to the open file.
pub fn builtin_file_write(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [port_value, Value::Str(s)] => {
            let port = as_port("file-write", port_value)?;
            let mut borrow = port.borrow_mut();
            let file = borrow
                .as_mut()
                .ok_or_else(|| EvalError::IOError("file-write: port is closed".to_string()))?;
            file.write_all(s.as_bytes()).map_err(|e| EvalError::IOError(e.to_string()))?;
            Ok(Value::Nil)
        }
        [_, other] => Err(EvalError::type_error("file-write", "string", &other.type_name())),
        _ => Err(EvalError::arity_error("file-write", "2", args.len())),
    }
}

pub fn register(env: &Rc<Environment>) {
    use crate::value::BuiltinProcedure;
    macro_rules! builtin {
        ($name:expr, $min:expr, $max:expr, $f:expr) => {
            env.define(
                $name.to_string(),
                Value::BuiltinProcedure(Rc::new(BuiltinProcedure {
                    name: $name.to_string(),
                    min_args: $min,
                    max_args: $max,
                    callable: $f,
                })),
            );
        };
    }

    builtin!("read", 0, Some(0), builtin_read);
    builtin!("write", 1, Some(1), builtin_write);
    builtin!("file-open", 2, Some(2), builtin_file_open);
    builtin!("file-close", 1, Some(1), builtin_file_close);
    builtin!("file-read", 1, Some(1), builtin_file_read);
    builtin!("file-write", 2, Some(2), builtin_file_write);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn file_write_then_file_read_roundtrips() {
        let path = std::env::temp_dir().join(format!("scheme-io-test-{}.txt", std::process::id()));
        let path_str = path.to_str().unwrap().to_string();

        let port = builtin_file_open(&[Value::Str(path_str.clone()), Value::Symbol("w".to_string())]).unwrap();
        builtin_file_write(&[port.clone(), Value::Str("hello".to_string())]).unwrap();
        builtin_file_close(&[port]).unwrap();

        let port = builtin_file_open(&[Value::Str(path_str.clone()), Value::Symbol("r".to_string())]).unwrap();
        let contents = builtin_file_read(&[port.clone()]).unwrap();
        assert!(matches!(contents, Value::Str(s) if s == "hello"));
        builtin_file_close(&[port]).unwrap();

        let _ = std::fs::remove_file(&path_str);
    }

    #[test]
    fn file_read_after_close_is_an_io_error() {
        let path = std::env::temp_dir().join(format!("scheme-io-test2-{}.txt", std::process::id()));
        let mut f = File::create(&path).unwrap();
        writeln!(f, "x").unwrap();

        let port = builtin_file_open(&[Value::Str(path.to_str().unwrap().to_string()), Value::Symbol("r".to_string())]).unwrap();
        builtin_file_close(&[port.clone()]).unwrap();
        assert!(builtin_file_read(&[port]).is_err());

        let _ = std::fs::remove_file(&path);
    }
}
