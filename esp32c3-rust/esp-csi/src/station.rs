//! Station link management: association, unconditional reconnect and DHCP.
//!
//! The radio only reports CSI for traffic it receives, so the station has to
//! stay associated with the access point. The reconnect decisions come from
//! [`csi_line::Link`].

use alloc::string::String;
use core::time::Duration;

use csi_line::{Action, Link};
use esp_hal::time::Instant;
use esp_radio::wifi::{AuthMethod, ClientConfig, ModeConfig, WifiController, WifiDevice, WifiError};
use log::{debug, info, warn};
use smoltcp::iface::{Config, Interface, SocketHandle, SocketSet, SocketStorage};
use smoltcp::socket::dhcpv4;
use smoltcp::wire::{EthernetAddress, HardwareAddress, IpCidr};

pub const SSID: &str = match option_env!("CSI_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "Connecting...",
};

pub const PASSWORD: &str = match option_env!("CSI_WIFI_PASSWORD") {
    Some(password) => password,
    None => "Error501",
};

pub struct Station<'a> {
    controller: WifiController<'a>,
    device: WifiDevice<'a>,
    iface: Interface,
    sockets: SocketSet<'a>,
    dhcp: SocketHandle,
    link: Link,
}

fn uptime() -> Duration {
    Duration::from_millis(Instant::now().duration_since_epoch().as_millis())
}

fn now() -> smoltcp::time::Instant {
    smoltcp::time::Instant::from_millis(uptime().as_millis() as i64)
}

/// Client configuration for [`SSID`], WPA2-PSK.
pub fn client_config() -> ModeConfig {
    ModeConfig::Client(
        ClientConfig::default()
            .with_ssid(String::from(SSID))
            .with_password(String::from(PASSWORD))
            .with_auth_method(AuthMethod::Wpa2Personal),
    )
}

impl<'a> Station<'a> {
    /// Configures station mode, starts the driver and issues the first
    /// connect request.
    pub fn start(
        mut controller: WifiController<'a>,
        mut device: WifiDevice<'a>,
        socket_storage: &'a mut [SocketStorage<'a>],
        random_seed: u64,
    ) -> Result<Self, WifiError> {
        controller.set_config(&client_config())?;
        controller.start()?;
        info!("Station started, joining \"{SSID}\"");

        let mut config = Config::new(HardwareAddress::Ethernet(EthernetAddress(
            device.mac_address(),
        )));
        config.random_seed = random_seed;
        let iface = Interface::new(config, &mut device, now());

        let mut sockets = SocketSet::new(socket_storage);
        let dhcp = sockets.add(dhcpv4::Socket::new());

        let mut station = Self {
            controller,
            device,
            iface,
            sockets,
            dhcp,
            link: Link::connecting(uptime()),
        };
        station.connect();
        Ok(station)
    }

    pub fn controller_mut(&mut self) -> &mut WifiController<'a> {
        &mut self.controller
    }

    fn connect(&mut self) {
        if let Err(err) = self.controller.connect() {
            warn!("Connect request failed: {err:?}");
        }
    }

    fn retry(&mut self) {
        self.drop_lease();
        self.connect();
        info!("Retrying WiFi connection...");
    }

    fn drop_lease(&mut self) {
        self.iface.update_ip_addrs(|addrs| addrs.clear());
        self.iface.routes_mut().remove_default_ipv4_route();
        self.sockets.get_mut::<dhcpv4::Socket>(self.dhcp).reset();
    }

    /// Drives association state and the DHCP client. Call continuously from
    /// the main loop.
    pub fn poll(&mut self) {
        let associated = matches!(self.controller.is_connected(), Ok(true));

        let (link, action) = self.link.step(associated, uptime());
        self.link = link;
        match action {
            Action::None => {}
            Action::Joined => debug!("Associated with \"{SSID}\""),
            Action::Retry => self.retry(),
        }

        if !self.link.is_associated() {
            return;
        }

        let _ = self
            .iface
            .poll(now(), &mut self.device, &mut self.sockets);

        let lease = match self.sockets.get_mut::<dhcpv4::Socket>(self.dhcp).poll() {
            None => return,
            Some(dhcpv4::Event::Configured(config)) => Some((config.address, config.router)),
            Some(dhcpv4::Event::Deconfigured) => None,
        };
        self.link = self.link.with_lease(lease.is_some());

        match lease {
            Some((address, router)) => {
                self.iface.update_ip_addrs(|addrs| {
                    addrs.clear();
                    let _ = addrs.push(IpCidr::Ipv4(address));
                });
                match router {
                    Some(router) => {
                        let _ = self.iface.routes_mut().add_default_ipv4_route(router);
                    }
                    None => {
                        self.iface.routes_mut().remove_default_ipv4_route();
                    }
                }
                info!("Got IP {address}");
                info!("WiFi connected. CSI should start appearing.");
            }
            None => {
                self.iface.update_ip_addrs(|addrs| addrs.clear());
                self.iface.routes_mut().remove_default_ipv4_route();
                warn!("DHCP lease lost");
            }
        }
    }
}
