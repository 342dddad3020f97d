use cart_store::config::Command;
use cart_store::utils::{logger, validation::Validate};
use cart_store::{
    Cart, CartSession, CartStore, CliConfig, ConsoleNotifier, FileStore, HttpInventory,
};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::debug!("CLI config: {:?}", cli);

    let config = match cli.validate().and_then(|_| cli.resolve()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            eprintln!("❌ {}", e);
            std::process::exit(2);
        }
    };

    let storage = FileStore::new(&config.storage.path);
    let inventory = HttpInventory::from_config(&config.api)?;
    let store = CartStore::load(storage, inventory, config.storage.key.clone()).await;
    let mut session = CartSession::new(store, ConsoleNotifier).with_messages(config.messages);

    match cli.command {
        Command::Show => {}
        Command::Add { product_id } => session.add_product(product_id).await,
        Command::Remove { product_id } => session.remove_product(product_id).await,
        Command::Update { product_id, amount } => {
            session.update_product_amount(product_id, amount).await
        }
    }

    print_cart(session.cart());

    if session.last_notice().is_some() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Cart is empty");
        return;
    }

    for item in cart {
        let title = item
            .attributes
            .get("title")
            .or_else(|| item.attributes.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("-");
        println!("{:>6}  x{:<4} {}", item.id, item.amount, title);
    }
    println!("{} items, {} units", cart.len(), cart.total_quantity());
}
