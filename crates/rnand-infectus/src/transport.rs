//! Transport layer abstraction for Infectus communication
//!
//! The driver talks through the `Transport` trait so the protocol logic
//! can be exercised against a scripted transport in tests; `UsbTransport`
//! is the real implementation over nusb bulk endpoints.

use nusb::transfer::{Queue, RequestBuffer};

use crate::error::{InfectusError, Result};
use crate::protocol::{BULK_IN_EP, BULK_OUT_EP, INFECTUS_VID};

/// Transport trait for moving raw frames to and from the adapter
pub trait Transport {
    /// Write bytes to the adapter; returns the number of bytes accepted,
    /// which may be less than `data.len()`
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read up to `buf.len()` bytes from the adapter; returns the number
    /// of bytes received
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}

/// USB bulk transport for a real Infectus adapter
pub struct UsbTransport {
    _device: nusb::Device,
    interface: nusb::Interface,
}

impl UsbTransport {
    /// Open the `device_index`-th adapter matching the Infectus vendor ID
    pub fn open(device_index: usize) -> Result<Self> {
        let matches: Vec<_> = nusb::list_devices()
            .map_err(|e| InfectusError::OpenFailed(e.to_string()))?
            .filter(|d| d.vendor_id() == INFECTUS_VID)
            .collect();

        if matches.is_empty() {
            return Err(InfectusError::DeviceNotFound);
        }

        let info = matches
            .get(device_index)
            .ok_or(InfectusError::DeviceNotFound)?;

        log::info!(
            "Opening Infectus adapter at bus {} address {} (product 0x{:04X})",
            info.bus_number(),
            info.device_address(),
            info.product_id()
        );

        let device = info
            .open()
            .map_err(|e| InfectusError::OpenFailed(e.to_string()))?;

        let interface = device
            .claim_interface(0)
            .map_err(|e| InfectusError::ClaimFailed(e.to_string()))?;

        for ep in [BULK_OUT_EP, BULK_IN_EP] {
            if let Err(e) = interface.clear_halt(ep) {
                log::warn!("clear_halt(0x{:02X}) failed: {}", ep, e);
            }
        }

        // One-shot vendor request the adapter expects at startup; its
        // purpose is undocumented by the vendor.
        let result = futures_lite::future::block_on(interface.control_out(
            nusb::transfer::ControlOut {
                control_type: nusb::transfer::ControlType::Vendor,
                recipient: nusb::transfer::Recipient::Device,
                request: 2,
                value: 2,
                index: 0,
                data: &[],
            },
        ));
        if let Err(e) = result.status {
            log::warn!("vendor init request failed: {}", e);
        }

        Ok(Self {
            _device: device,
            interface,
        })
    }
}

impl Transport for UsbTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut queue: Queue<Vec<u8>> = self.interface.bulk_out_queue(BULK_OUT_EP);
        queue.submit(data.to_vec());

        let completion = futures_lite::future::block_on(queue.next_complete());
        completion
            .status
            .map_err(|e| InfectusError::TransferFailed(e.to_string()))?;

        let n = completion.data.actual_length();
        log::trace!("USB write {} of {} bytes", n, data.len());
        Ok(n)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut queue: Queue<RequestBuffer> = self.interface.bulk_in_queue(BULK_IN_EP);
        queue.submit(RequestBuffer::new(buf.len()));

        let completion = futures_lite::future::block_on(queue.next_complete());
        completion
            .status
            .map_err(|e| InfectusError::TransferFailed(e.to_string()))?;

        let n = completion.data.len().min(buf.len());
        buf[..n].copy_from_slice(&completion.data[..n]);
        log::trace!("USB read {} bytes", n);
        Ok(n)
    }
}
