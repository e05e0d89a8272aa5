use std::io::Write;

use crate::error::{ImportError, Result};

/// 输出一行导入完成的配对
///
/// 下游按空白切分 pairs 列表，图像名中不允许出现任何空白字符
pub fn emit<W: Write>(out: &mut W, name_a: &str, name_b: &str) -> Result<()> {
    for name in [name_a, name_b] {
        if name.chars().any(char::is_whitespace) {
            return Err(ImportError::Constraint(format!("图像名含有空白字符: {name:?}")));
        }
    }
    writeln!(out, "{name_a} {name_b}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn emits_single_line() {
        let mut out = Vec::new();
        emit(&mut out, "a.png", "b.png").unwrap();
        emit(&mut out, "b.png", "c.png").unwrap();
        assert_eq!(out, b"a.png b.png\nb.png c.png\n");
    }

    #[rstest]
    #[case("bad name", "b.png")]
    #[case("a.png", "bad name")]
    #[case("tab\tname", "b.png")]
    #[case("a.png", "nl\nname")]
    fn rejects_whitespace(#[case] a: &str, #[case] b: &str) {
        let mut out = Vec::new();
        let err = emit(&mut out, a, b).unwrap_err();
        assert!(matches!(err, ImportError::Constraint(_)));
        assert!(out.is_empty());
    }
}
