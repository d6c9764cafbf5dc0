use clap::Parser;
use vaultzero::cli::commands::{self, add::AddArgs, update::UpdateArgs};
use vaultzero::cli::{CardAction, Cli, Commands};
use vaultzero::generator::PasswordOptions;
use vaultzero::vault::CreditCardInput;

fn main() {
    let cli = Cli::parse();

    let level = if matches!(cli.command, Commands::Serve) {
        "info"
    } else {
        "warn"
    };
    vaultzero::logging::init_stderr(level);

    let result = match cli.command {
        Commands::Init => commands::init::execute(&cli),
        Commands::Serve => commands::serve::execute(&cli),
        Commands::List { favorites } => commands::list::execute(&cli, favorites),
        Commands::Show { ref id, reveal } => commands::show::execute(&cli, id, reveal),
        Commands::Add {
            ref service,
            ref url,
            ref username,
            ref category,
            ref password,
            generate,
        } => commands::add::execute(
            &cli,
            AddArgs {
                service,
                url,
                username,
                category,
                password: password.as_deref(),
                generate,
            },
        ),
        Commands::Update {
            ref id,
            ref service,
            ref url,
            ref username,
            ref category,
            ref password,
            generate,
        } => commands::update::execute(
            &cli,
            id,
            UpdateArgs {
                service: service.as_deref(),
                url: url.as_deref(),
                username: username.as_deref(),
                category: category.as_deref(),
                password: password.as_deref(),
                generate,
            },
        ),
        Commands::Delete { ref id, force } => commands::delete::execute(&cli, id, force),
        Commands::Favorite { ref id } => commands::favorite::execute(&cli, id),
        Commands::Search { ref url } => commands::search::execute(&cli, url),
        Commands::Import { ref file } => commands::import_cmd::execute(&cli, file),
        Commands::Export { ref file, force } => commands::export::execute(&cli, file, force),
        Commands::Backup { ref path } => commands::backup::execute_backup(&cli, path),
        Commands::Restore { ref path } => commands::backup::execute_restore(&cli, path),
        Commands::ChangePassword => commands::change_password::execute(&cli),
        Commands::Card { ref action } => match action {
            CardAction::List { reveal } => commands::card::execute_list(&cli, *reveal),
            CardAction::Add {
                name,
                holder,
                number,
                month,
                year,
                cvv,
                card_type,
                zip,
            } => commands::card::execute_add(
                &cli,
                CreditCardInput {
                    card_name: name.clone(),
                    cardholder_name: holder.clone(),
                    card_number: number.clone(),
                    expiry_month: month.clone(),
                    expiry_year: year.clone(),
                    cvv: cvv.clone(),
                    card_type: card_type.clone(),
                    billing_zip: zip.clone(),
                },
            ),
            CardAction::Delete { id, force } => commands::card::execute_delete(&cli, id, *force),
        },
        Commands::Generate {
            length,
            no_uppercase,
            no_lowercase,
            no_digits,
            no_symbols,
            exclude_ambiguous,
        } => commands::generate::execute(&PasswordOptions {
            length,
            uppercase: !no_uppercase,
            lowercase: !no_lowercase,
            digits: !no_digits,
            symbols: !no_symbols,
            exclude_ambiguous,
        }),
        Commands::Destroy { force } => commands::destroy::execute(&cli, force),
    };

    if let Err(e) = result {
        vaultzero::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
