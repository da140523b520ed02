use crate::address::Address;
use crate::error::{Error, Result};

/// Round-robin pool of server addresses.
///
/// Duplicates are allowed. The rotation cursor is shared by every caller of
/// [`Cluster::next_host`], independent of insertion or removal order.
#[derive(Debug, Clone, Default)]
pub struct Cluster {
    hosts: Vec<Address>,
    next_index: usize,
}

impl Cluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hosts(hosts: impl IntoIterator<Item = Address>) -> Self {
        Self {
            hosts: hosts.into_iter().collect(),
            next_index: 0,
        }
    }

    /// Append a host to the end of the rotation.
    pub fn add_host(&mut self, address: Address) {
        self.hosts.push(address);
    }

    /// Remove the first host equal to `address`.
    pub fn remove_host(&mut self, address: &Address) -> Result<()> {
        let index = self
            .hosts
            .iter()
            .position(|host| host == address)
            .ok_or_else(|| Error::HostNotFound {
                address: address.clone(),
            })?;
        self.hosts.remove(index);
        Ok(())
    }

    /// Get the next host in rotation.
    pub fn next_host(&mut self) -> Result<Address> {
        if self.hosts.is_empty() {
            return Err(Error::NoAvailableHost);
        }

        let host = self.hosts[self.next_index % self.hosts.len()].clone();
        self.next_index = (self.next_index + 1) % self.hosts.len();
        Ok(host)
    }

    pub fn hosts(&self) -> &[Address] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl From<Address> for Cluster {
    fn from(address: Address) -> Self {
        Self::with_hosts([address])
    }
}
