#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gemini_course_proxy_lib::run()
        .await
        .map_err(anyhow::Error::msg)
}
