use super::*;

#[test]
fn no_subcommand_serves() {
    let cli = Cli::try_parse_from(["site-portal"]).unwrap();
    assert_eq!(cli.command(), Command::Serve);
}

#[test]
fn explicit_subcommands_parse() {
    assert_eq!(Cli::try_parse_from(["site-portal", "serve"]).unwrap().command(), Command::Serve);
    assert_eq!(Cli::try_parse_from(["site-portal", "uninstall"]).unwrap().command(), Command::Uninstall);
}

#[test]
fn misspelled_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["site-portal", "uninstal"]).is_err());
}

#[test]
fn extra_arguments_are_rejected() {
    assert!(Cli::try_parse_from(["site-portal", "uninstall", "now"]).is_err());
}
