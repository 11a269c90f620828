use {
    crate::error::Result,
    std::time::Duration,
};

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the metadata, referral and log requests. A request that has
/// not completed after `timeout` fails with a timeout error.
pub fn client_with_timeout(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

pub fn client() -> Result<reqwest::Client> {
    client_with_timeout(HTTP_TIMEOUT)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::ReclaimError,
            metadata::fetch_image,
        },
        tokio::net::TcpListener,
    };

    #[tokio::test]
    async fn test_unresponsive_host_does_not_hang() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        // accept connections and never answer them
        let server = tokio::spawn(async move {
            let mut connections = vec![];
            while let Ok((socket, _)) = listener.accept().await {
                connections.push(socket);
            }
        });

        let client = client_with_timeout(Duration::from_millis(200)).unwrap();
        let uri = format!("http://{address}/metadata.json");
        let result =
            tokio::time::timeout(Duration::from_secs(5), fetch_image(&client, &uri)).await;

        assert!(matches!(result, Ok(Err(ReclaimError::Http(_)))));
        server.abort();
    }

    #[test]
    fn test_default_client_builds() {
        assert!(client().is_ok());
    }
}
