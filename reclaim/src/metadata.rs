//! Metaplex token metadata.
//!
//! Only the leading fields of a metadata account are read:
//!
//! ```text
//! key: u8 | update_authority: [u8; 32] | mint: [u8; 32]
//! name: u32 len + bytes | symbol: u32 len + bytes | uri: u32 len + bytes
//! ```
//!
//! String fields are stored NUL-padded to a fixed width, so the padding and
//! surrounding whitespace are stripped.
use {
    crate::{
        constants::{
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID,
        },
        error::{
            ReclaimError,
            Result,
        },
    },
    byteorder::{
        LittleEndian,
        ReadBytesExt,
    },
    serde::Deserialize,
    solana_sdk::pubkey::Pubkey,
    std::io::{
        Cursor,
        Read,
    },
};

const HEADER_LEN: u64 = 1 + 32 + 32;
// Upper bound on a single string field, well above the on-chain maximum (200).
const MAX_FIELD_LEN: u32 = 1_024;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnChainMetadata {
    pub mint:   Pubkey,
    pub name:   String,
    pub symbol: String,
    pub uri:    String,
}

/// A token account together with whatever is known about its mint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenMetadata {
    pub name:     String,
    pub symbol:   String,
    pub uri:      String,
    pub image:    String,
    pub balance:  f64,
    pub decimals: u8,
    /// The token account, not the mint.
    pub address:  Pubkey,
    pub mint:     Pubkey,
    pub amount:   u64,
}

#[derive(Debug, Deserialize)]
struct OffChainMetadata {
    #[serde(default)]
    image: Option<String>,
}

pub fn get_metadata_address(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            METADATA_SEED,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn parse_metadata(data: &[u8]) -> Result<OnChainMetadata> {
    if (data.len() as u64) < HEADER_LEN {
        return Err(ReclaimError::InvalidMetadata("account too short"));
    }
    let mint = Pubkey::try_from(&data[33..65])
        .map_err(|_| ReclaimError::InvalidMetadata("bad mint"))?;

    let mut cursor = Cursor::new(data);
    cursor.set_position(HEADER_LEN);
    let name = read_string(&mut cursor)?;
    let symbol = read_string(&mut cursor)?;
    let uri = read_string(&mut cursor)?;

    Ok(OnChainMetadata {
        mint,
        name,
        symbol,
        uri,
    })
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| ReclaimError::InvalidMetadata("truncated length"))?;
    if len > MAX_FIELD_LEN {
        return Err(ReclaimError::InvalidMetadata("field too long"));
    }
    let mut buf = vec![0u8; len as usize];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| ReclaimError::InvalidMetadata("truncated field"))?;
    Ok(String::from_utf8_lossy(&buf)
        .trim_end_matches('\0')
        .trim()
        .to_string())
}

/// Reads the `image` field from the JSON document a metadata `uri` points at.
pub async fn fetch_image(client: &reqwest::Client, uri: &str) -> Result<String> {
    let document: OffChainMetadata = client
        .get(uri)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(document.image.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_field(out: &mut Vec<u8>, value: &str, width: usize) {
        out.extend_from_slice(&(width as u32).to_le_bytes());
        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(width, 0);
        out.extend_from_slice(&bytes);
    }

    fn metadata_account(mint: &Pubkey, name: &str, symbol: &str, uri: &str) -> Vec<u8> {
        let mut data = vec![4u8];
        data.extend_from_slice(Pubkey::new_unique().as_ref());
        data.extend_from_slice(mint.as_ref());
        encode_field(&mut data, name, 32);
        encode_field(&mut data, symbol, 10);
        encode_field(&mut data, uri, 200);
        // creators, collection, ... are never read
        data.extend_from_slice(&[1, 0, 0, 0, 0xff]);
        data
    }

    #[test]
    fn test_parse_padded_fields() {
        let mint = Pubkey::new_unique();
        let data = metadata_account(
            &mint,
            "Bonk ",
            "BONK",
            "https://arweave.net/hQiPZOsRZXGXBJd_82PhVdlM_hACsT_q6wqwf5cSY7I",
        );

        let metadata = parse_metadata(&data).unwrap();
        assert_eq!(metadata.mint, mint);
        assert_eq!(metadata.name, "Bonk");
        assert_eq!(metadata.symbol, "BONK");
        assert_eq!(
            metadata.uri,
            "https://arweave.net/hQiPZOsRZXGXBJd_82PhVdlM_hACsT_q6wqwf5cSY7I"
        );
    }

    #[test]
    fn test_parse_empty_uri() {
        let mint = Pubkey::new_unique();
        let data = metadata_account(&mint, "Nameless", "", "");
        let metadata = parse_metadata(&data).unwrap();
        assert_eq!(metadata.symbol, "");
        assert_eq!(metadata.uri, "");
    }

    #[test]
    fn test_parse_truncated() {
        let mint = Pubkey::new_unique();
        let data = metadata_account(&mint, "Bonk", "BONK", "https://example.com");

        assert!(matches!(
            parse_metadata(&data[..40]),
            Err(ReclaimError::InvalidMetadata(_))
        ));
        assert!(matches!(
            parse_metadata(&data[..80]),
            Err(ReclaimError::InvalidMetadata("truncated field"))
        ));
    }

    #[test]
    fn test_parse_rejects_huge_length() {
        let mut data = vec![4u8; 65];
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            parse_metadata(&data),
            Err(ReclaimError::InvalidMetadata("field too long"))
        ));
    }

    #[test]
    fn test_metadata_address_is_deterministic() {
        let mint = Pubkey::new_unique();
        assert_eq!(get_metadata_address(&mint), get_metadata_address(&mint));
        assert_ne!(
            get_metadata_address(&mint),
            get_metadata_address(&Pubkey::new_unique())
        );
    }
}
