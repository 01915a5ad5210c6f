use errors::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    node::runner::run().await
}
