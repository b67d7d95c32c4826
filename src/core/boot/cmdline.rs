//! Arquivo: core/boot/cmdline.rs
//!
//! Propósito: Parser da Linha de Comando do Kernel.
//! Gerencia os parâmetros passados pelo Bootloader (ex: "debug",
//! "ahci_reset_mode=aggressive").
//!
//! Detalhes de Implementação:
//! - Armazenamento estático (sem heap) para estar disponível muito cedo no boot.
//! - Tokens separados por espaço: `chave=valor` ou flag isolada.
//! - Inicializada uma única vez (`spin::Once`); leituras posteriores não travam.

use spin::Once;

/// Tamanho máximo da linha de comando
const CMDLINE_MAX_LEN: usize = 256;

/// Chave que seleciona a política de bring-up das portas AHCI
const AHCI_RESET_MODE_KEY: &str = "ahci_reset_mode";

/// Política de bring-up aplicada a TODAS as portas de um handler AHCI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AhciResetMode {
    /// Inicialização não destrutiva: preserva o estado deixado pelo firmware.
    #[default]
    Conservative,
    /// Reset completo de hardware em cada porta.
    Aggressive,
}

impl AhciResetMode {
    /// Interpreta o valor textual da opção. `None` para valores desconhecidos.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "conservative" => Some(Self::Conservative),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Aggressive => "aggressive",
        }
    }
}

pub struct CommandLine {
    buffer: [u8; CMDLINE_MAX_LEN],
    len: usize,
}

impl CommandLine {
    pub const fn empty() -> Self {
        Self {
            buffer: [0; CMDLINE_MAX_LEN],
            len: 0,
        }
    }

    /// Copia `args`, truncando em `CMDLINE_MAX_LEN` sem cortar um caractere UTF-8.
    pub fn new(args: &str) -> Self {
        let mut len = core::cmp::min(args.len(), CMDLINE_MAX_LEN);
        while !args.is_char_boundary(len) {
            len -= 1;
        }

        let mut cmdline = Self::empty();
        cmdline.buffer[..len].copy_from_slice(&args.as_bytes()[..len]);
        cmdline.len = len;

        if len < args.len() {
            crate::kwarn!("(CMDLINE) Linha truncada, bytes=", args.len());
        }
        cmdline
    }

    /// Texto armazenado
    pub fn as_str(&self) -> &str {
        // Truncamento respeita fronteira de caractere, então sempre é UTF-8
        core::str::from_utf8(&self.buffer[..self.len]).unwrap_or_default()
    }

    /// Verifica se uma flag (chave sem valor) ou parâmetro existe.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Obtém o valor de um parâmetro (ex: "root" -> "/dev/sda").
    /// Se for flag ("debug"), retorna `Some("")`. A última ocorrência vence.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.as_str()
            .split_ascii_whitespace()
            .filter_map(|token| match token.split_once('=') {
                Some((k, v)) if k == key => Some(v),
                None if token == key => Some(""),
                _ => None,
            })
            .last()
    }

    /// Política de reset AHCI. Ausente ou inválida => `Conservative`.
    pub fn ahci_reset_mode(&self) -> AhciResetMode {
        match self.get(AHCI_RESET_MODE_KEY) {
            None => AhciResetMode::default(),
            Some(value) => AhciResetMode::parse(value).unwrap_or_else(|| {
                crate::kwarn!("(CMDLINE) ahci_reset_mode desconhecido, usando conservative");
                AhciResetMode::default()
            }),
        }
    }
}

/// Instância global da linha de comando
static CMDLINE: Once<CommandLine> = Once::new();

/// Linha vazia devolvida antes do `init`
static EMPTY: CommandLine = CommandLine::empty();

/// Inicializa a linha de comando. Chamadas posteriores são ignoradas.
pub fn init(args: &str) {
    let mut first = false;
    CMDLINE.call_once(|| {
        first = true;
        CommandLine::new(args)
    });
    if first {
        crate::kinfo!("(CMDLINE) Linha de comando registrada, bytes=", args.len());
    } else {
        crate::kwarn!("(CMDLINE) init chamado mais de uma vez; ignorado");
    }
}

/// Linha de comando do kernel (vazia se `init` ainda não rodou).
pub fn get() -> &'static CommandLine {
    CMDLINE.get().unwrap_or(&EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_key_values() {
        let cmdline = CommandLine::new("quiet root=/dev/sda1  console=ttyS0 ");
        assert!(cmdline.has("quiet"));
        assert_eq!(cmdline.get("quiet"), Some(""));
        assert_eq!(cmdline.get("root"), Some("/dev/sda1"));
        assert_eq!(cmdline.get("console"), Some("ttyS0"));
        assert_eq!(cmdline.get("roo"), None);
        assert!(!cmdline.has("debug"));
    }

    #[test]
    fn last_occurrence_wins() {
        let cmdline = CommandLine::new("ahci_reset_mode=aggressive ahci_reset_mode=conservative");
        assert_eq!(cmdline.ahci_reset_mode(), AhciResetMode::Conservative);
    }

    #[test]
    fn ahci_reset_mode_values() {
        assert_eq!(
            CommandLine::new("ahci_reset_mode=aggressive").ahci_reset_mode(),
            AhciResetMode::Aggressive
        );
        assert_eq!(
            CommandLine::new("ahci_reset_mode=conservative").ahci_reset_mode(),
            AhciResetMode::Conservative
        );
        assert_eq!(
            CommandLine::new("quiet").ahci_reset_mode(),
            AhciResetMode::Conservative
        );
        assert_eq!(
            CommandLine::new("ahci_reset_mode=bogus").ahci_reset_mode(),
            AhciResetMode::Conservative
        );
        // Flag sem valor também não é um modo válido
        assert_eq!(
            CommandLine::new("ahci_reset_mode").ahci_reset_mode(),
            AhciResetMode::Conservative
        );
    }

    #[test]
    fn truncates_on_char_boundary() {
        let mut long = "a".repeat(CMDLINE_MAX_LEN - 1);
        long.push('é');
        let cmdline = CommandLine::new(&long);
        assert_eq!(cmdline.as_str().len(), CMDLINE_MAX_LEN - 1);
        assert!(cmdline.as_str().bytes().all(|b| b == b'a'));
    }

    #[test]
    fn global_instance_initializes_once() {
        init("ahci_reset_mode=aggressive");
        init("ahci_reset_mode=conservative");
        assert_eq!(get().ahci_reset_mode(), AhciResetMode::Aggressive);
    }
}
