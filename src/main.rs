use std::io::{self, Write};

use text_io::read;
use tracing_subscriber::{self, EnvFilter};

use zsm_webauthn_demo::config::ZsmConfig;
use zsm_webauthn_demo::soft::SoftProvider;
use zsm_webauthn_demo::webauthn::WebAuthnDriver;

#[tokio::main]
pub async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .without_time()
        .init();

    let mut driver = WebAuthnDriver::new(Box::new(SoftProvider), ZsmConfig::default());
    driver.initialize().await;
    if let Some(message) = driver.error_message() {
        eprintln!("{}", message);
    }

    println!("WebAuthn demo client. Commands:");
    println!("  input            enter options JSON, empty line to finish");
    println!("  example-create   load the example creation options");
    println!("  example-get      load the example assertion options");
    println!("  create | get | retrieve");
    println!("  show | clear | clear-output | config | quit");

    loop {
        print!("> ");
        io::stdout().flush().unwrap();
        let line: String = read!("{}\n");

        match line.trim() {
            "create" => {
                driver.create().await;
                print_output(&driver);
            }
            "get" => {
                driver.get().await;
                print_output(&driver);
            }
            "retrieve" => {
                driver.retrieve().await;
                print_output(&driver);
            }
            "example-create" => {
                driver.load_example_create();
                println!("{}", driver.input_text());
            }
            "example-get" => {
                driver.load_example_get();
                match driver.error_message() {
                    Some(message) => eprintln!("{}", message),
                    None => println!("{}", driver.input_text()),
                }
            }
            "input" => {
                println!("Enter options JSON, empty line to finish:");
                let mut buffer = String::new();
                loop {
                    let entry: String = read!("{}\n");
                    if entry.is_empty() {
                        break;
                    }
                    buffer.push_str(&entry);
                    buffer.push('\n');
                }
                driver.set_input_text(buffer.trim_end());
            }
            "show" => {
                println!("input:");
                println!("{}", driver.input_text());
                println!("output:");
                print_output(&driver);
            }
            "clear" => driver.clear_input(),
            "clear-output" => driver.clear_output(),
            "config" => {
                let config = prompt_config(driver.config());
                driver.save_config(config).await;
                match driver.error_message() {
                    Some(message) => eprintln!("{}", message),
                    None => println!("Settings saved."),
                }
            }
            "quit" | "exit" => break,
            "" => {}
            other => println!("Unknown command: {}", other),
        }
    }
}

fn print_output(driver: &WebAuthnDriver) {
    if !driver.output_text().is_empty() {
        println!("{}", driver.output_text());
    }
    if let Some(message) = driver.error_message() {
        eprintln!("{}", message);
    }
}

fn prompt_config(current: &ZsmConfig) -> ZsmConfig {
    let mut config = current.clone();
    config.host_url = prompt_field("Host URL", &config.host_url);
    config.application_id = prompt_field("Application ID", &config.application_id);
    config.consumer_id = prompt_field("Consumer ID", &config.consumer_id);
    config
}

fn prompt_field(label: &str, current: &str) -> String {
    print!("{} [{}]: ", label, current);
    io::stdout().flush().unwrap();
    let entry: String = read!("{}\n");
    if entry.is_empty() {
        current.to_owned()
    } else {
        entry
    }
}
