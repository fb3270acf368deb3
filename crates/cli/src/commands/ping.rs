use powermemo_client::PowermemoClient;

pub async fn run(client: &PowermemoClient) -> anyhow::Result<()> {
    if client.ping().await {
        println!("PowerMemo at {} is healthy.", client.base_url());
        Ok(())
    } else {
        eprintln!("Failed to reach PowerMemo at {}.", client.base_url());
        std::process::exit(1);
    }
}
