use crate::command_flags::CardFamily;
use crate::commands::{CommandDescriptor, COMMANDS};
use crate::error::Error;

/// Lookup handle over the static command table
#[derive(Copy, Clone, Debug)]
pub struct CommandRegistry {
    commands: &'static [CommandDescriptor],
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self { commands: COMMANDS }
    }

    /// Find the descriptor of `opcode` for a card of `family`.
    ///
    /// Common commands match any family; asking for `CardFamily::Common` only matches
    /// common commands.
    pub fn resolve(
        &self,
        opcode: u8,
        family: CardFamily,
        app: bool,
    ) -> Result<&'static CommandDescriptor, Error> {
        self.commands
            .iter()
            .find(|command| {
                command.opcode == opcode
                    && command.is_app_command == app
                    && command.card_family.applies_to(family)
            })
            .ok_or(Error::UnknownCommand { opcode, family, app })
    }

    /// Check that `command` may be sent to a card of `family`
    pub fn validate(&self, command: &CommandDescriptor, family: CardFamily) -> Result<(), Error> {
        match command.card_family.applies_to(family) {
            true => Ok(()),
            false => Err(Error::Mismatch { expected: family, actual: command.card_family }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static CommandDescriptor> {
        self.commands.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commands::*;

    const FAMILIES: [CardFamily; 3] = [CardFamily::Common, CardFamily::Mmc, CardFamily::Sd];

    #[test]
    fn test_every_entry_resolves() {
        let registry = CommandRegistry::new();
        for command in registry.iter() {
            let resolved =
                registry.resolve(command.opcode, command.card_family, command.is_app_command);
            assert_eq!(resolved.unwrap(), command, "{}", command.name);
        }
    }

    #[test]
    fn test_nothing_else_resolves() {
        let registry = CommandRegistry::new();
        for opcode in 0..64u8 {
            for &family in FAMILIES.iter() {
                for &app in [false, true].iter() {
                    let candidates = registry
                        .iter()
                        .filter(|command| {
                            command.opcode == opcode
                                && command.is_app_command == app
                                && command.card_family.applies_to(family)
                        })
                        .count();
                    assert!(candidates <= 1, "CMD{} {:?} {}", opcode, family, app);
                    match registry.resolve(opcode, family, app) {
                        Ok(command) => {
                            assert_eq!(candidates, 1);
                            assert_eq!(command.opcode, opcode);
                            assert_eq!(command.is_app_command, app);
                        }
                        Err(_) => assert_eq!(candidates, 0),
                    }
                }
            }
        }
    }

    #[test]
    fn test_family_disambiguates() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.resolve(2, CardFamily::Mmc, false).unwrap(), &CMD2_ALL_SEND_CID_MMC);
        assert_eq!(registry.resolve(2, CardFamily::Sd, false).unwrap(), &CMD2_ALL_SEND_CID_SD);
        assert!(registry.resolve(2, CardFamily::Common, false).is_err());
        assert_eq!(registry.resolve(6, CardFamily::Mmc, false).unwrap(), &CMD6_SWITCH);
        assert_eq!(registry.resolve(6, CardFamily::Sd, false).unwrap(), &CMD6_SWITCH_FUNC);
        assert_eq!(registry.resolve(6, CardFamily::Sd, true).unwrap(), &ACMD6_SET_BUS_WIDTH);
        assert_eq!(registry.resolve(13, CardFamily::Mmc, false).unwrap(), &CMD13_SEND_STATUS);
    }

    #[test]
    fn test_unknown() {
        let registry = CommandRegistry::new();
        assert!(matches!(
            registry.resolve(21, CardFamily::Mmc, false),
            Err(Error::UnknownCommand { opcode: 21, family: CardFamily::Mmc, app: false })
        ));
        assert!(registry.resolve(41, CardFamily::Mmc, true).is_err());
        assert!(registry.resolve(41, CardFamily::Sd, false).is_err());
    }

    #[test]
    fn test_validate() {
        let registry = CommandRegistry::new();
        assert!(registry.validate(&CMD13_SEND_STATUS, CardFamily::Sd).is_ok());
        assert!(registry.validate(&CMD1_SEND_OP_COND, CardFamily::Mmc).is_ok());
        assert!(matches!(
            registry.validate(&ACMD41_SD_SEND_OP_COND, CardFamily::Mmc),
            Err(Error::Mismatch { expected: CardFamily::Mmc, actual: CardFamily::Sd })
        ));
    }
}
