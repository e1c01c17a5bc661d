//! Consumer store key space
//!
//! Every logical field owns exactly one tag byte. Singleton fields are stored
//! under `[tag]`; indexed collections append an index suffix to that tag:
//!
//! | field                      | key                           |
//! |----------------------------|-------------------------------|
//! | historical info            | `[tag] ++ be64(height)`       |
//! | packet maturity time       | `[tag] ++ be64(packet id)`    |
//! | height -> valset update id | `[tag] ++ be64(height)`       |
//! | outstanding downtime       | `[tag] ++ len(addr) ++ addr`  |
//! | cross-chain validator      | `[tag] ++ addr`               |
//!
//! Layouts are fixed by existing on-chain state and must not change.

use ccv_core::{CcvError, CcvResult, ConsAddress};

/// Module name
pub const MODULE_NAME: &str = "ccvconsumer";

/// Default port id the consumer module binds to
pub const PORT_ID: &str = "consumer";

/// Store key for the consumer module
pub const STORE_KEY: &str = MODULE_NAME;

/// Message route for the consumer module
pub const ROUTER_KEY: &str = MODULE_NAME;

/// Querier route for the consumer module
pub const QUERIER_ROUTE: &str = MODULE_NAME;

/// Number of historical info entries kept, same as the staking default
pub const HISTORICAL_ENTRIES: u32 = 10_000;

/// Root name of the consumer-redistribution account
pub const CONSUMER_REDISTRIBUTE_NAME: &str = "cons_redistribute";

/// Buffer account for fees waiting to be transferred to the provider chain
pub const CONSUMER_TO_SEND_TO_PROVIDER_NAME: &str = "cons_to_send_to_provider";

/// Longest identifier that fits behind a one-byte length prefix
pub const MAX_LENGTH_PREFIXED_LEN: usize = u8::MAX as usize;

const INDEX_LEN: usize = 8;

/// Whether a field holds one value or a keyed collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Singleton,
    Indexed,
}

/// Logical fields of the consumer store, each with its reserved tag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Field {
    /// Bound port id
    Port = 0,
    /// Last distribution transmission to the provider
    LastDistributionTransmission = 1,
    /// Unbonding period
    UnbondingTime = 2,
    /// Client id of the provider client
    ProviderClient = 3,
    /// Channel id of the CCV channel
    ProviderChannel = 4,
    /// Validator set changes received over the CCV channel but not yet
    /// flushed to consensus
    PendingChanges = 5,
    /// Historical info by block height
    HistoricalInfo = 6,
    /// Maturity time by received VSC packet id
    PacketMaturityTime = 7,
    /// Block height to valset update id
    HeightValsetUpdateId = 8,
    /// Outstanding downtime flag by validator consensus address
    OutstandingDowntime = 9,
    /// Slash requests to send once the CCV channel is established
    PendingSlashRequests = 10,
    /// Cross-chain validators by consensus address
    CrossChainValidator = 11,
}

impl Field {
    /// Every field, in tag order
    pub const ALL: [Field; 12] = [
        Field::Port,
        Field::LastDistributionTransmission,
        Field::UnbondingTime,
        Field::ProviderClient,
        Field::ProviderChannel,
        Field::PendingChanges,
        Field::HistoricalInfo,
        Field::PacketMaturityTime,
        Field::HeightValsetUpdateId,
        Field::OutstandingDowntime,
        Field::PendingSlashRequests,
        Field::CrossChainValidator,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Port => "port",
            Field::LastDistributionTransmission => "last distribution transmission",
            Field::UnbondingTime => "unbonding time",
            Field::ProviderClient => "provider client",
            Field::ProviderChannel => "provider channel",
            Field::PendingChanges => "pending changes",
            Field::HistoricalInfo => "historical info",
            Field::PacketMaturityTime => "packet maturity time",
            Field::HeightValsetUpdateId => "height valset update id",
            Field::OutstandingDowntime => "outstanding downtime",
            Field::PendingSlashRequests => "pending slash requests",
            Field::CrossChainValidator => "cross-chain validator",
        }
    }

    pub const fn kind(self) -> FieldKind {
        match self {
            Field::Port
            | Field::LastDistributionTransmission
            | Field::UnbondingTime
            | Field::ProviderClient
            | Field::ProviderChannel
            | Field::PendingChanges => FieldKind::Singleton,
            Field::HistoricalInfo
            | Field::PacketMaturityTime
            | Field::HeightValsetUpdateId
            | Field::OutstandingDowntime
            | Field::PendingSlashRequests
            | Field::CrossChainValidator => FieldKind::Indexed,
        }
    }

    /// The one-byte key (singletons) or key prefix (collections)
    pub fn prefix(self) -> Vec<u8> {
        vec![self.tag()]
    }

    pub fn from_tag(tag: u8) -> Option<Field> {
        Field::ALL.get(tag as usize).copied()
    }

    /// Field a full key belongs to, judged by its leading tag byte
    pub fn of_key(key: &[u8]) -> Option<Field> {
        key.first().and_then(|tag| Field::from_tag(*tag))
    }
}

// Tag table must stay injective and fit in one byte.
const _: () = {
    assert!(Field::ALL.len() <= 256);
    let mut i = 0;
    while i < Field::ALL.len() {
        assert!(Field::ALL[i].tag() as usize == i, "tag table out of order");
        let mut j = i + 1;
        while j < Field::ALL.len() {
            assert!(Field::ALL[i].tag() != Field::ALL[j].tag(), "duplicate tag byte");
            j += 1;
        }
        i += 1;
    }
};

pub const PORT_BYTE_KEY: u8 = Field::Port.tag();
pub const LAST_DISTRIBUTION_TRANSMISSION_BYTE_KEY: u8 = Field::LastDistributionTransmission.tag();
pub const UNBONDING_TIME_BYTE_KEY: u8 = Field::UnbondingTime.tag();
pub const PROVIDER_CLIENT_BYTE_KEY: u8 = Field::ProviderClient.tag();
pub const PROVIDER_CHANNEL_BYTE_KEY: u8 = Field::ProviderChannel.tag();
pub const PENDING_CHANGES_BYTE_KEY: u8 = Field::PendingChanges.tag();
pub const HISTORICAL_INFO_BYTE_PREFIX: u8 = Field::HistoricalInfo.tag();
pub const PACKET_MATURITY_TIME_BYTE_PREFIX: u8 = Field::PacketMaturityTime.tag();
pub const HEIGHT_VALSET_UPDATE_ID_BYTE_PREFIX: u8 = Field::HeightValsetUpdateId.tag();
pub const OUTSTANDING_DOWNTIME_BYTE_PREFIX: u8 = Field::OutstandingDowntime.tag();
pub const PENDING_SLASH_REQUESTS_BYTE_PREFIX: u8 = Field::PendingSlashRequests.tag();
pub const CROSS_CHAIN_VALIDATOR_BYTE_PREFIX: u8 = Field::CrossChainValidator.tag();

// ============ Singleton keys ============

/// Key of the bound port id
pub fn port_key() -> Vec<u8> {
    Field::Port.prefix()
}

/// Key of the last distribution transmission
pub fn last_distribution_transmission_key() -> Vec<u8> {
    Field::LastDistributionTransmission.prefix()
}

/// Key of the unbonding period
pub fn unbonding_time_key() -> Vec<u8> {
    Field::UnbondingTime.prefix()
}

/// Key of the provider client id
pub fn provider_client_key() -> Vec<u8> {
    Field::ProviderClient.prefix()
}

/// Key of the provider channel id
pub fn provider_channel_key() -> Vec<u8> {
    Field::ProviderChannel.prefix()
}

/// Key of the pending validator set changes
pub fn pending_changes_key() -> Vec<u8> {
    Field::PendingChanges.prefix()
}

// ============ Collection prefixes ============

pub fn historical_info_prefix() -> Vec<u8> {
    Field::HistoricalInfo.prefix()
}

pub fn packet_maturity_time_prefix() -> Vec<u8> {
    Field::PacketMaturityTime.prefix()
}

pub fn height_valset_update_id_prefix() -> Vec<u8> {
    Field::HeightValsetUpdateId.prefix()
}

pub fn outstanding_downtime_prefix() -> Vec<u8> {
    Field::OutstandingDowntime.prefix()
}

/// The pending slash request list lives directly under its prefix
pub fn pending_slash_requests_prefix() -> Vec<u8> {
    Field::PendingSlashRequests.prefix()
}

pub fn cross_chain_validator_prefix() -> Vec<u8> {
    Field::CrossChainValidator.prefix()
}

// ============ Indexed keys ============

fn indexed_be64(field: Field, index: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + INDEX_LEN);
    key.push(field.tag());
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// Key of the historical info at `height`.
///
/// The height is reinterpreted as unsigned, so negative heights sort after
/// every non-negative one.
pub fn historical_info_key(height: i64) -> Vec<u8> {
    indexed_be64(Field::HistoricalInfo, height as u64)
}

/// Key of the maturity time of the received VSC packet `id`
pub fn packet_maturity_time_key(id: u64) -> Vec<u8> {
    indexed_be64(Field::PacketMaturityTime, id)
}

/// Key of the valset update id recorded at `height`
pub fn height_valset_update_id_key(height: u64) -> Vec<u8> {
    indexed_be64(Field::HeightValsetUpdateId, height)
}

/// Key of a validator's outstanding downtime flag.
///
/// The address is length-prefixed so that no non-empty address key is a
/// prefix of another address's key. An empty address yields the bare prefix,
/// which every downtime key starts with.
pub fn outstanding_downtime_key(addr: &[u8]) -> CcvResult<Vec<u8>> {
    let mut key = Field::OutstandingDowntime.prefix();
    key.extend_from_slice(&length_prefix(addr)?);
    Ok(key)
}

/// Key of a cross-chain validator record.
///
/// Unlike the downtime key, the address is appended raw.
pub fn cross_chain_validator_key(addr: &[u8]) -> Vec<u8> {
    let mut key = Field::CrossChainValidator.prefix();
    key.extend_from_slice(addr);
    key
}

/// Prefix `bytes` with its length as a single byte.
///
/// Empty input is returned unchanged, matching the address length-prefix
/// convention used by the rest of the chain.
pub fn length_prefix(bytes: &[u8]) -> CcvResult<Vec<u8>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    if bytes.len() > MAX_LENGTH_PREFIXED_LEN {
        return Err(CcvError::InvalidInput(format!(
            "identifier length should be max {} bytes, got {}",
            MAX_LENGTH_PREFIXED_LEN,
            bytes.len()
        )));
    }
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(bytes.len() as u8);
    out.extend_from_slice(bytes);
    Ok(out)
}

// ============ Key decoding ============

fn strip_tag(field: Field, key: &[u8]) -> CcvResult<&[u8]> {
    match key.split_first() {
        Some((tag, rest)) if *tag == field.tag() => Ok(rest),
        Some((tag, _)) => Err(CcvError::malformed_key(
            field.name(),
            format!("expected tag {:#04x}, got {:#04x}", field.tag(), tag),
        )),
        None => Err(CcvError::malformed_key(field.name(), "empty key")),
    }
}

fn decode_be64(field: Field, key: &[u8]) -> CcvResult<u64> {
    let suffix = strip_tag(field, key)?;
    let bytes: [u8; INDEX_LEN] = suffix.try_into().map_err(|_| {
        CcvError::malformed_key(
            field.name(),
            format!("expected {} index bytes, got {}", INDEX_LEN, suffix.len()),
        )
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Packet id embedded in a full maturity time key
pub fn id_from_packet_maturity_time_key(key: &[u8]) -> CcvResult<u64> {
    decode_be64(Field::PacketMaturityTime, key)
}

/// Height embedded in a full valset update id key
pub fn height_from_valset_update_id_key(key: &[u8]) -> CcvResult<u64> {
    decode_be64(Field::HeightValsetUpdateId, key)
}

/// Height embedded in a full historical info key
pub fn height_from_historical_info_key(key: &[u8]) -> CcvResult<i64> {
    decode_be64(Field::HistoricalInfo, key).map(|h| h as i64)
}

/// Consensus address embedded in a full outstanding downtime key
pub fn address_from_outstanding_downtime_key(key: &[u8]) -> CcvResult<ConsAddress> {
    let field = Field::OutstandingDowntime;
    let suffix = strip_tag(field, key)?;
    let Some((len, addr)) = suffix.split_first() else {
        return Ok(ConsAddress::default());
    };
    if addr.len() != *len as usize {
        return Err(CcvError::malformed_key(
            field.name(),
            format!("length byte says {}, found {} address bytes", len, addr.len()),
        ));
    }
    Ok(ConsAddress::from(addr))
}

/// Consensus address embedded in a full cross-chain validator key
pub fn address_from_cross_chain_validator_key(key: &[u8]) -> CcvResult<ConsAddress> {
    strip_tag(Field::CrossChainValidator, key).map(ConsAddress::from)
}
