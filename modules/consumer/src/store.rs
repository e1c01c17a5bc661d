//! Typed access to the consumer store
//!
//! All keys come from [`crate::keys`]; values use the simplest encoding that
//! fits (UTF-8 for identifiers, big-endian `u64` for numbers, raw bytes for
//! records encoded elsewhere).

use ccv_core::{CcvError, CcvResult, ConsAddress, KvStore, StoreChange};
use ccv_state::prefix_end;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::keys::{self, Field};

/// Maturity time of one received VSC packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketMaturity {
    pub packet_id: u64,
    /// Unix time in nanoseconds
    pub maturity_time: u64,
}

/// Consumer module view over an ordered key-value store
pub struct ConsumerStore<S: KvStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KvStore + ?Sized> Clone for ConsumerStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore + ?Sized> ConsumerStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Underlying store
    pub fn inner(&self) -> &Arc<S> {
        &self.store
    }

    // ============ Identifiers ============

    pub async fn get_port(&self) -> CcvResult<Option<String>> {
        self.get_string(Field::Port, &keys::port_key()).await
    }

    pub async fn set_port(&self, port_id: &str) -> CcvResult<()> {
        self.store.set(&keys::port_key(), port_id.as_bytes()).await
    }

    pub async fn get_provider_client(&self) -> CcvResult<Option<String>> {
        self.get_string(Field::ProviderClient, &keys::provider_client_key())
            .await
    }

    pub async fn set_provider_client(&self, client_id: &str) -> CcvResult<()> {
        debug!(client_id, "Setting provider client");
        self.store
            .set(&keys::provider_client_key(), client_id.as_bytes())
            .await
    }

    pub async fn get_provider_channel(&self) -> CcvResult<Option<String>> {
        self.get_string(Field::ProviderChannel, &keys::provider_channel_key())
            .await
    }

    pub async fn set_provider_channel(&self, channel_id: &str) -> CcvResult<()> {
        debug!(channel_id, "Setting provider channel");
        self.store
            .set(&keys::provider_channel_key(), channel_id.as_bytes())
            .await
    }

    pub async fn delete_provider_channel(&self) -> CcvResult<()> {
        self.store.delete(&keys::provider_channel_key()).await
    }

    // ============ Opaque singletons ============

    pub async fn get_last_distribution_transmission(&self) -> CcvResult<Option<Vec<u8>>> {
        self.store
            .get(&keys::last_distribution_transmission_key())
            .await
    }

    pub async fn set_last_distribution_transmission(&self, record: &[u8]) -> CcvResult<()> {
        self.store
            .set(&keys::last_distribution_transmission_key(), record)
            .await
    }

    pub async fn get_pending_changes(&self) -> CcvResult<Option<Vec<u8>>> {
        self.store.get(&keys::pending_changes_key()).await
    }

    pub async fn set_pending_changes(&self, changes: &[u8]) -> CcvResult<()> {
        self.store.set(&keys::pending_changes_key(), changes).await
    }

    pub async fn delete_pending_changes(&self) -> CcvResult<()> {
        self.store.delete(&keys::pending_changes_key()).await
    }

    pub async fn get_pending_slash_requests(&self) -> CcvResult<Option<Vec<u8>>> {
        self.store.get(&keys::pending_slash_requests_prefix()).await
    }

    pub async fn set_pending_slash_requests(&self, requests: &[u8]) -> CcvResult<()> {
        self.store
            .set(&keys::pending_slash_requests_prefix(), requests)
            .await
    }

    pub async fn delete_pending_slash_requests(&self) -> CcvResult<()> {
        self.store.delete(&keys::pending_slash_requests_prefix()).await
    }

    // ============ Unbonding time ============

    pub async fn get_unbonding_time(&self) -> CcvResult<Option<Duration>> {
        let raw = self.store.get(&keys::unbonding_time_key()).await?;
        raw.map(|bytes| decode_u64(Field::UnbondingTime, &bytes).map(Duration::from_nanos))
            .transpose()
    }

    pub async fn set_unbonding_time(&self, period: Duration) -> CcvResult<()> {
        let nanos = u64::try_from(period.as_nanos()).map_err(|_| {
            CcvError::InvalidInput(format!("unbonding period {:?} overflows u64 nanos", period))
        })?;
        self.store
            .set(&keys::unbonding_time_key(), &nanos.to_be_bytes())
            .await
    }

    // ============ Packet maturity times ============

    pub async fn get_packet_maturity_time(&self, packet_id: u64) -> CcvResult<Option<u64>> {
        let raw = self
            .store
            .get(&keys::packet_maturity_time_key(packet_id))
            .await?;
        raw.map(|bytes| decode_u64(Field::PacketMaturityTime, &bytes))
            .transpose()
    }

    pub async fn set_packet_maturity_time(&self, packet_id: u64, maturity_time: u64) -> CcvResult<()> {
        debug!(packet_id, maturity_time, "Recording packet maturity time");
        self.store
            .set(
                &keys::packet_maturity_time_key(packet_id),
                &maturity_time.to_be_bytes(),
            )
            .await
    }

    pub async fn delete_packet_maturity_time(&self, packet_id: u64) -> CcvResult<()> {
        self.store
            .delete(&keys::packet_maturity_time_key(packet_id))
            .await
    }

    /// Maturity times of every packet with id `<= max_id`, in id order
    pub async fn maturity_times_up_to(&self, max_id: u64) -> CcvResult<Vec<PacketMaturity>> {
        let start = keys::packet_maturity_time_key(0);
        let end = match max_id.checked_add(1) {
            Some(next) => keys::packet_maturity_time_key(next),
            None => prefix_end(&keys::packet_maturity_time_prefix())
                .ok_or_else(|| CcvError::Internal("maturity prefix has no upper bound".to_string()))?,
        };

        let entries = self.store.iter_range(&start, &end).await?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(PacketMaturity {
                packet_id: keys::id_from_packet_maturity_time_key(&entry.key)?,
                maturity_time: decode_u64(Field::PacketMaturityTime, &entry.value)?,
            });
        }
        Ok(out)
    }

    // ============ Height -> valset update id ============

    pub async fn get_height_valset_update_id(&self, height: u64) -> CcvResult<Option<u64>> {
        let raw = self
            .store
            .get(&keys::height_valset_update_id_key(height))
            .await?;
        raw.map(|bytes| decode_u64(Field::HeightValsetUpdateId, &bytes))
            .transpose()
    }

    pub async fn set_height_valset_update_id(&self, height: u64, vscid: u64) -> CcvResult<()> {
        self.store
            .set(&keys::height_valset_update_id_key(height), &vscid.to_be_bytes())
            .await
    }

    pub async fn delete_height_valset_update_id(&self, height: u64) -> CcvResult<()> {
        self.store
            .delete(&keys::height_valset_update_id_key(height))
            .await
    }

    // ============ Outstanding downtime ============

    pub async fn set_outstanding_downtime(&self, addr: &ConsAddress) -> CcvResult<()> {
        let key = keys::outstanding_downtime_key(addr.as_bytes())?;
        debug!(validator = %addr, "Flagging outstanding downtime");
        self.store.set(&key, &[]).await
    }

    pub async fn has_outstanding_downtime(&self, addr: &ConsAddress) -> CcvResult<bool> {
        let key = keys::outstanding_downtime_key(addr.as_bytes())?;
        self.store.has(&key).await
    }

    pub async fn delete_outstanding_downtime(&self, addr: &ConsAddress) -> CcvResult<()> {
        let key = keys::outstanding_downtime_key(addr.as_bytes())?;
        self.store.delete(&key).await
    }

    /// Every validator currently flagged, in key order.
    ///
    /// Keys that fail to decode are logged and skipped.
    pub async fn outstanding_downtimes(&self) -> CcvResult<Vec<ConsAddress>> {
        let entries = self
            .store
            .iter_prefix(&keys::outstanding_downtime_prefix())
            .await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match keys::address_from_outstanding_downtime_key(&entry.key) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    warn!(key = %hex::encode(&entry.key), error = %e, "Skipping undecodable downtime key");
                    None
                }
            })
            .collect())
    }

    // ============ Cross-chain validators ============

    pub async fn get_cross_chain_validator(&self, addr: &ConsAddress) -> CcvResult<Option<Vec<u8>>> {
        self.store
            .get(&keys::cross_chain_validator_key(addr.as_bytes()))
            .await
    }

    pub async fn set_cross_chain_validator(&self, addr: &ConsAddress, record: &[u8]) -> CcvResult<()> {
        self.store
            .set(&keys::cross_chain_validator_key(addr.as_bytes()), record)
            .await
    }

    pub async fn delete_cross_chain_validator(&self, addr: &ConsAddress) -> CcvResult<()> {
        self.store
            .delete(&keys::cross_chain_validator_key(addr.as_bytes()))
            .await
    }

    /// All cross-chain validator records keyed by consensus address
    pub async fn cross_chain_validators(&self) -> CcvResult<Vec<(ConsAddress, Vec<u8>)>> {
        let entries = self
            .store
            .iter_prefix(&keys::cross_chain_validator_prefix())
            .await?;
        entries
            .into_iter()
            .map(|entry| {
                keys::address_from_cross_chain_validator_key(&entry.key)
                    .map(|addr| (addr, entry.value))
            })
            .collect()
    }

    // ============ Historical info ============

    pub async fn get_historical_info(&self, height: i64) -> CcvResult<Option<Vec<u8>>> {
        self.store.get(&keys::historical_info_key(height)).await
    }

    pub async fn set_historical_info(&self, height: i64, info: &[u8]) -> CcvResult<()> {
        self.store.set(&keys::historical_info_key(height), info).await
    }

    pub async fn delete_historical_info(&self, height: i64) -> CcvResult<()> {
        self.store.delete(&keys::historical_info_key(height)).await
    }

    /// Drop historical info at heights `<= current_height - entries`.
    ///
    /// Returns the number of entries removed.
    pub async fn prune_historical_info(&self, current_height: i64, entries: u32) -> CcvResult<usize> {
        let Some(cutoff) = current_height
            .checked_sub(i64::from(entries))
            .filter(|c| *c >= 0)
        else {
            return Ok(0);
        };

        let stale = self
            .store
            .iter_range(
                &keys::historical_info_key(0),
                &keys::historical_info_key(cutoff.saturating_add(1)),
            )
            .await?;
        let count = stale.len();
        if count == 0 {
            return Ok(0);
        }

        let changes = stale
            .into_iter()
            .map(|entry| StoreChange::Delete { key: entry.key })
            .collect();
        self.store.apply_batch(changes).await?;

        debug!(current_height, pruned = count, "Pruned historical info");
        Ok(count)
    }

    async fn get_string(&self, field: Field, key: &[u8]) -> CcvResult<Option<String>> {
        match self.store.get(key).await? {
            Some(bytes) => String::from_utf8(bytes).map(Some).map_err(|e| {
                CcvError::ValueCorruption(format!("{} is not UTF-8: {}", field.name(), e))
            }),
            None => Ok(None),
        }
    }
}

fn decode_u64(field: Field, bytes: &[u8]) -> CcvResult<u64> {
    let arr: [u8; 8] = bytes.try_into().map_err(|_| {
        CcvError::ValueCorruption(format!(
            "{} value should be 8 bytes, got {}",
            field.name(),
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccv_state::{MemoryStore, PersistentStore};
    use tempfile::TempDir;

    fn memory_consumer() -> ConsumerStore<MemoryStore> {
        ConsumerStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_identifiers() {
        let store = memory_consumer();
        assert_eq!(store.get_port().await.unwrap(), None);

        store.set_port("consumer").await.unwrap();
        store.set_provider_client("07-tendermint-0").await.unwrap();
        store.set_provider_channel("channel-0").await.unwrap();

        assert_eq!(store.get_port().await.unwrap().as_deref(), Some("consumer"));
        assert_eq!(
            store.get_provider_client().await.unwrap().as_deref(),
            Some("07-tendermint-0")
        );
        assert_eq!(
            store.get_provider_channel().await.unwrap().as_deref(),
            Some("channel-0")
        );

        store.delete_provider_channel().await.unwrap();
        assert_eq!(store.get_provider_channel().await.unwrap(), None);

        // Port id is stored under the single tag byte
        let raw = store.inner().get(&[keys::PORT_BYTE_KEY]).await.unwrap();
        assert_eq!(raw, Some(b"consumer".to_vec()));
    }

    #[tokio::test]
    async fn test_non_utf8_identifier_is_corruption() {
        let store = memory_consumer();
        store
            .inner()
            .set(&keys::provider_client_key(), &[0xff, 0xfe])
            .await
            .unwrap();
        assert!(matches!(
            store.get_provider_client().await,
            Err(CcvError::ValueCorruption(_))
        ));
    }

    #[tokio::test]
    async fn test_unbonding_time() {
        let store = memory_consumer();
        let period = Duration::from_secs(21 * 24 * 3600);
        store.set_unbonding_time(period).await.unwrap();
        assert_eq!(store.get_unbonding_time().await.unwrap(), Some(period));

        assert!(matches!(
            store.set_unbonding_time(Duration::MAX).await,
            Err(CcvError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_maturity_times_up_to() {
        let store = memory_consumer();
        for id in [300u64, 1, 65536, 2, u64::MAX] {
            store.set_packet_maturity_time(id, id.wrapping_mul(10)).await.unwrap();
        }
        // Unrelated field sharing the key space
        store.set_height_valset_update_id(5, 5).await.unwrap();

        let ids: Vec<u64> = store
            .maturity_times_up_to(300)
            .await
            .unwrap()
            .iter()
            .map(|m| m.packet_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 300]);

        let all = store.maturity_times_up_to(u64::MAX).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all.last().unwrap().packet_id, u64::MAX);

        store.delete_packet_maturity_time(2).await.unwrap();
        assert_eq!(store.get_packet_maturity_time(2).await.unwrap(), None);
        assert_eq!(store.get_packet_maturity_time(1).await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_height_valset_update_id() {
        let store = memory_consumer();
        store.set_height_valset_update_id(300, 7).await.unwrap();
        store.set_height_valset_update_id(65536, 8).await.unwrap();

        assert_eq!(store.get_height_valset_update_id(300).await.unwrap(), Some(7));
        store.delete_height_valset_update_id(300).await.unwrap();
        assert_eq!(store.get_height_valset_update_id(300).await.unwrap(), None);

        let entries = store
            .inner()
            .iter_prefix(&keys::height_valset_update_id_prefix())
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(keys::height_from_valset_update_id_key(&entries[0].key).unwrap(), 65536);
    }

    #[tokio::test]
    async fn test_corrupt_u64_value() {
        let store = memory_consumer();
        store
            .inner()
            .set(&keys::height_valset_update_id_key(1), &[1, 2, 3])
            .await
            .unwrap();
        assert!(matches!(
            store.get_height_valset_update_id(1).await,
            Err(CcvError::ValueCorruption(_))
        ));
    }

    #[tokio::test]
    async fn test_outstanding_downtime() {
        let store = memory_consumer();
        let short = ConsAddress::new(vec![0x01]);
        let long = ConsAddress::new(vec![0x01, 0x02]);

        store.set_outstanding_downtime(&long).await.unwrap();
        assert!(!store.has_outstanding_downtime(&short).await.unwrap());

        store.set_outstanding_downtime(&short).await.unwrap();
        assert_eq!(
            store.outstanding_downtimes().await.unwrap(),
            vec![short.clone(), long.clone()]
        );

        store.delete_outstanding_downtime(&short).await.unwrap();
        assert!(store.has_outstanding_downtime(&long).await.unwrap());
        assert_eq!(store.outstanding_downtimes().await.unwrap(), vec![long]);

        let oversized = ConsAddress::new(vec![0u8; 300]);
        assert!(matches!(
            store.set_outstanding_downtime(&oversized).await,
            Err(CcvError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_outstanding_downtimes_skip_malformed() {
        let store = memory_consumer();
        store
            .inner()
            .set(&[keys::OUTSTANDING_DOWNTIME_BYTE_PREFIX, 5, 0xaa], &[])
            .await
            .unwrap();
        store
            .set_outstanding_downtime(&ConsAddress::new(vec![0xbb]))
            .await
            .unwrap();

        let flagged = store.outstanding_downtimes().await.unwrap();
        assert_eq!(flagged, vec![ConsAddress::new(vec![0xbb])]);
    }

    #[tokio::test]
    async fn test_cross_chain_validators() {
        let store = memory_consumer();
        let a = ConsAddress::new(vec![0xab, 0xcd]);
        let b = ConsAddress::new(vec![0xab, 0xcd, 0xef]);

        store.set_cross_chain_validator(&b, b"record-b").await.unwrap();
        store.set_cross_chain_validator(&a, b"record-a").await.unwrap();
        store.set_pending_slash_requests(b"slashes").await.unwrap();

        let validators = store.cross_chain_validators().await.unwrap();
        assert_eq!(
            validators,
            vec![(a.clone(), b"record-a".to_vec()), (b.clone(), b"record-b".to_vec())]
        );

        store.delete_cross_chain_validator(&a).await.unwrap();
        assert_eq!(store.get_cross_chain_validator(&a).await.unwrap(), None);
        assert_eq!(
            store.get_cross_chain_validator(&b).await.unwrap(),
            Some(b"record-b".to_vec())
        );
    }

    #[tokio::test]
    async fn test_opaque_singletons() {
        let store = memory_consumer();
        store.set_pending_changes(b"changes").await.unwrap();
        store.set_pending_slash_requests(b"slashes").await.unwrap();
        store.set_last_distribution_transmission(b"ldt").await.unwrap();

        assert_eq!(store.get_pending_changes().await.unwrap(), Some(b"changes".to_vec()));
        assert_eq!(
            store.get_last_distribution_transmission().await.unwrap(),
            Some(b"ldt".to_vec())
        );

        store.delete_pending_changes().await.unwrap();
        store.delete_pending_slash_requests().await.unwrap();
        assert_eq!(store.get_pending_changes().await.unwrap(), None);
        assert_eq!(store.get_pending_slash_requests().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prune_historical_info() {
        let store = memory_consumer();
        for height in 1..=10 {
            store
                .set_historical_info(height, format!("h{}", height).as_bytes())
                .await
                .unwrap();
        }

        assert_eq!(store.prune_historical_info(10, 3).await.unwrap(), 7);
        assert_eq!(store.get_historical_info(7).await.unwrap(), None);
        assert_eq!(store.get_historical_info(8).await.unwrap(), Some(b"h8".to_vec()));
        assert_eq!(store.prune_historical_info(10, 3).await.unwrap(), 0);
        assert_eq!(store.prune_historical_info(2, 3).await.unwrap(), 0);

        store.delete_historical_info(10).await.unwrap();
        assert_eq!(store.get_historical_info(10).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prune_historical_info_far_negative_height() {
        let store = memory_consumer();
        for height in 1..=5 {
            store.set_historical_info(height, b"info").await.unwrap();
        }

        assert_eq!(store.prune_historical_info(i64::MIN + 5, 10_000).await.unwrap(), 0);
        assert_eq!(store.prune_historical_info(i64::MIN, u32::MAX).await.unwrap(), 0);
        for height in 1..=5 {
            assert_eq!(store.get_historical_info(height).await.unwrap(), Some(b"info".to_vec()));
        }
    }

    #[tokio::test]
    async fn test_consumer_store_over_sled() {
        let tmp = TempDir::new().unwrap();
        let store = ConsumerStore::new(Arc::new(PersistentStore::open(tmp.path()).unwrap()));

        store.set_packet_maturity_time(2, 20).await.unwrap();
        store.set_packet_maturity_time(1, 10).await.unwrap();
        store.set_packet_maturity_time(256, 30).await.unwrap();

        let matured = store.maturity_times_up_to(255).await.unwrap();
        assert_eq!(
            matured,
            vec![
                PacketMaturity { packet_id: 1, maturity_time: 10 },
                PacketMaturity { packet_id: 2, maturity_time: 20 },
            ]
        );
    }

    #[tokio::test]
    async fn test_consumer_store_over_dyn_backend() {
        let backend = ccv_state::open_store(&ccv_core::StoreConfig::default()).unwrap();
        let store = ConsumerStore::new(backend);
        store.set_port("consumer").await.unwrap();
        assert_eq!(store.get_port().await.unwrap().as_deref(), Some("consumer"));
    }
}
