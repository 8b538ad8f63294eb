use crate::*;

fn words(source: &str) -> Vec<u16> {
    let _ = env_logger::builder().is_test(true).try_init();
    assemble(source)
        .unwrap()
        .chunks(2)
        .map(|word| u16::from_le_bytes([word[0], word[1]]))
        .collect()
}

fn error(source: &str) -> AssemblerError {
    assemble(source).unwrap_err()
}

#[test]
fn test_parse_register() {
    assert_eq!(register("r0"), Some(0));
    assert_eq!(register("r13"), Some(13));
    assert_eq!(register("sp"), Some(14));
    assert_eq!(register("ip"), Some(15));
    assert_eq!(register("r15"), Some(15));
    assert_eq!(register("r16"), None);
    assert_eq!(register("r01"), None);
    assert_eq!(register("x1"), None);
    assert_eq!(register("r+1"), None);
    assert_eq!(register("r-0"), None);
    assert_eq!(register("r"), None);
}

#[test]
fn test_parse_immediate() {
    assert_eq!(immediate("10"), Some(10));
    assert_eq!(immediate("0x80"), Some(0x80));
    assert_eq!(immediate("0b101"), Some(5));
    assert_eq!(immediate("0xg"), None);
    assert_eq!(parse_operand("r2"), Ok(Left(2)));
    assert_eq!(parse_operand("0x1f"), Ok(Right(0x1f)));
    assert_eq!(
        parse_operand("12ab"),
        Err(AssemblerErrorKind::InvalidImmediate("12ab".into()))
    );
    assert_eq!(
        parse_operand("rx"),
        Err(AssemblerErrorKind::InvalidRegister("rx".into()))
    );
}

#[test]
fn test_signed_operands() {
    assert_eq!(immediate("+5"), None);
    assert_eq!(immediate("0x+1"), None);
    assert_eq!(immediate("0b-1"), None);
    assert_eq!(
        error("li r1 -1").kind,
        AssemblerErrorKind::InvalidImmediate("-1".into())
    );
    assert_eq!(
        error("li r1 +5").kind,
        AssemblerErrorKind::InvalidImmediate("+5".into())
    );
    assert_eq!(
        error("push r+1").kind,
        AssemblerErrorKind::InvalidRegister("r+1".into())
    );
}

#[test]
fn test_instruction_layout() {
    assert_eq!(words("li r0 0"), [0x0000]);
    assert_eq!(words("li r1 10"), [0x1a00]);
    assert_eq!(words("push r2"), [0x2001]);
    assert_eq!(words("int 0x80"), [0x8002]);
    assert_eq!(words("halt"), [0x0003]);
    assert_eq!(words("add r3, r4"), [0x3404]);
    assert_eq!(words("xorw sp ip"), [0xef0f]);
    assert_eq!(words(".word 0xbeef"), [0xbeef]);
}

#[test]
fn test_image_bytes() {
    // Opcode first, then the operand byte.
    assert_eq!(assemble("li r1 10\nint 0x80").unwrap(), [0x00, 0x1a, 0x02, 0x80]);
}

#[test]
fn test_comments_and_blank_lines() {
    let source = "
        # write \"test\" to the console
        li r0 0       # syscall(write)
        li r1 10      # address

        li r2 8       # len
        push r1
        push r2
        int 0x80
        halt
    ";
    assert_eq!(
        words(source),
        [0x0000, 0x1a00, 0x2800, 0x1001, 0x2001, 0x8002, 0x0003]
    );
}

#[test]
fn test_unknown_operation() {
    assert_eq!(
        error("li r0 1\njmp r1"),
        AssemblerError {
            line: 2,
            kind: AssemblerErrorKind::UnknownOperation("jmp".into())
        }
    );
}

#[test]
fn test_operand_count() {
    assert_eq!(
        error("push").kind,
        AssemblerErrorKind::OperandCount {
            mnemonic: "push".into(),
            expected: 1,
            found: 0
        }
    );
    assert_eq!(
        error("halt r0").kind,
        AssemblerErrorKind::OperandCount {
            mnemonic: "halt".into(),
            expected: 0,
            found: 1
        }
    );
}

#[test]
fn test_operand_kinds() {
    assert_eq!(error("push 3").kind, AssemblerErrorKind::ExpectedRegister(3));
    assert_eq!(error("li r1 r2").kind, AssemblerErrorKind::ExpectedImmediate(2));
    assert_eq!(
        error("add r1 q").kind,
        AssemblerErrorKind::InvalidRegister("q".into())
    );
}

#[test]
fn test_immediate_range() {
    assert_eq!(words("li r1 15"), [0x1f00]);
    assert_eq!(
        error("li r1 16").kind,
        AssemblerErrorKind::ImmediateOutOfRange { value: 16, max: 15 }
    );
    assert_eq!(
        error("int 256").kind,
        AssemblerErrorKind::ImmediateOutOfRange {
            value: 256,
            max: 255
        }
    );
}

#[test]
fn test_error_display() {
    assert_eq!(
        error("\n\nfoo").to_string(),
        "line 3: unknown operation `foo`"
    );
}
