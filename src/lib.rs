pub mod assembly;
pub mod ast;
pub mod compiler;
pub mod error;
pub mod labeling;
pub mod lexer;
pub mod parser;

use compiler::AssemblyOutput;
use error::{CompileError, SourceMetadata};

/// Parses, labels and generates a whole source file, stopping at the first error.
pub fn compile(source: &SourceMetadata) -> Result<AssemblyOutput, CompileError> {
    let program = parser::Parser::new(source).parse_program()?;
    let weights = labeling::label_program(&program);
    Ok(compiler::compile_program(&program, &weights, source)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::process::Command;

    fn have_toolchain() -> bool {
        cfg!(all(target_arch = "x86_64", target_os = "linux"))
            && Command::new("cc")
                .arg("--version")
                .output()
                .map_or(false, |out| out.status.success())
    }

    /// Scratch directory removed when dropped, whichever way the test leaves.
    struct ScratchDir(PathBuf);

    impl ScratchDir {
        fn new(name: &str) -> std::io::Result<Self> {
            let dir = std::env::temp_dir().join(format!("sethic-{}-{}", std::process::id(), name));
            std::fs::create_dir_all(&dir)?;
            Ok(Self(dir))
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    /// Compiles, assembles, links and runs `source`. `None` when no C toolchain is around,
    /// unless `SETHIC_REQUIRE_CC` is set, which turns the skip into a failure.
    fn run(name: &str, source: &str) -> anyhow::Result<Option<String>> {
        if !have_toolchain() {
            anyhow::ensure!(
                std::env::var_os("SETHIC_REQUIRE_CC").is_none(),
                "`{name}` needs an x86-64 `cc`"
            );
            eprintln!("skipping `{name}`: no x86-64 `cc` available");
            return Ok(None);
        }
        let meta = SourceMetadata::new(source);
        let assembly = compile(&meta)?;
        let dir = ScratchDir::new(name)?;
        let asm_path = dir.0.join("program.s");
        let exe_path = dir.0.join("program");
        std::fs::write(&asm_path, assembly.to_string())?;
        let status = Command::new("cc").arg(&asm_path).arg("-o").arg(&exe_path).status()?;
        anyhow::ensure!(status.success(), "cc failed on:\n{}", assembly);
        let out = Command::new(&exe_path).output()?;
        anyhow::ensure!(out.status.success(), "`{name}` exited with {}", out.status);
        Ok(Some(String::from_utf8(out.stdout)?))
    }

    #[test]
    fn scratch_dirs_are_removed_on_drop() -> anyhow::Result<()> {
        let dir = ScratchDir::new("scratch")?;
        let path = dir.0.clone();
        std::fs::write(path.join("program.s"), "")?;
        drop(dir);
        assert!(!path.exists());
        Ok(())
    }

    fn expect_output(name: &str, source: &str, expected: &str) -> anyhow::Result<()> {
        if let Some(stdout) = run(name, source)? {
            assert_eq!(stdout, expected, "{source}");
        }
        Ok(())
    }

    #[test]
    fn prints_a_sum() -> anyhow::Result<()> {
        expect_output("sum", "fun int main() print(2 + 3); return(0) endfun", "5 \n")
    }

    #[test]
    fn globals_hold_assigned_values() -> anyhow::Result<()> {
        expect_output(
            "global",
            "var int x;\nfun int main() x = 10; print(x); return(0) endfun",
            "10 \n",
        )
    }

    #[test]
    fn arguments_and_return_values_flow() -> anyhow::Result<()> {
        expect_output(
            "call",
            "fun int add(int a, int b) return(a + b) endfun\n\
             fun int main() print(add(2, 3)); print(add(add(1, 2), add(3, 4) * 2)); return(0) endfun",
            "5 \n17 \n",
        )
    }

    #[test]
    fn branches_follow_the_condition() -> anyhow::Result<()> {
        expect_output(
            "branch",
            "fun int main()
                if 1 < 2 then print(1) else print(0) endif;
                if 2 <= 1 then print(1) else print(0) endif;
                if 3 == 3 then print(7) endif;
                return(0)
             endfun",
            "1 \n0 \n7 \n",
        )
    }

    #[test]
    fn loops_recheck_their_condition() -> anyhow::Result<()> {
        expect_output(
            "loop",
            "fun int main() var int x;
                x = 0;
                while x < 3 do x = x + 1 endwhile;
                print(x);
                while x < 0 do print(99) endwhile;
                return(0)
             endfun",
            "3 \n",
        )
    }

    #[test]
    fn reordered_operands_keep_their_value() -> anyhow::Result<()> {
        expect_output(
            "reorder",
            "fun int main() var int a, b, c, d;
                a = 1; b = 2; c = 3; d = 4;
                print((a + b) * (c + d));
                print(a + (b + c) * (c + d));
                print((c + d) - (a + b));
                print(a - (b - (c - d)));
                print((c * d + a) / (b + a - 1));
                return(0)
             endfun",
            "21 \n36 \n4 \n-2 \n6 \n",
        )
    }

    #[test]
    fn swapped_commutative_operands_print_the_same() -> anyhow::Result<()> {
        const SETUP: &str = "fun int main() var int a, b, c, d; a = 1; b = 6; c = 3; d = 4;";
        let source = |first: &str, second: &str| {
            format!(
                "{SETUP} print(({first}) * ({second})); print(({first}) == ({second})); \
                 print(({first}) == ({second}) + 1); return(0) endfun"
            )
        };
        let original = run("swap-original", &source("a + b", "c + d"))?;
        let swapped = run("swap-swapped", &source("c + d", "a + b"))?;
        assert_eq!(original, swapped);
        if let Some(stdout) = original {
            assert_eq!(stdout, "49 \n1 \n0 \n");
        }
        Ok(())
    }

    #[test]
    fn recursion_and_nested_scopes() -> anyhow::Result<()> {
        expect_output(
            "recursion",
            "var int calls;
             fun int fib(int n)
                calls = calls + 1;
                if n < 2 then return(n) else
                    var int r; r = fib(n - 1) + fib(n - 2); return(r)
                endif
             endfun
             fun int main() print(fib(10)); print(calls); return(0) endfun",
            "55 \n177 \n",
        )
    }

    #[test]
    fn syntax_errors_stop_the_pipeline() {
        let meta = SourceMetadata::new("fun int main() print(1 +) endfun");
        assert!(matches!(compile(&meta), Err(CompileError::Parse(_))));
    }
}
