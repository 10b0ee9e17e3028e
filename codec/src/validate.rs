//! Checks that span two independently decoded structures.
//!
//! Decoders never call these. A caller holding a handshake and the key
//! material it carries decides when consistency matters.

use thiserror::Error;

use crate::extension::{Extension, ExtensionType};
use crate::handshake::{EncryptionField, ExtensionFlags, Handshake, HandshakeType};
use crate::keymat::KeyMaterial;
use crate::limits::CodecLimits;

/// Cross-structure consistency errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// Wrapped key size differs from the key size the handshake advertises.
    #[error("key material carries {actual}-byte keys, handshake advertises {expected}")]
    KeyLengthMismatch { expected: usize, actual: usize },

    /// Key material present while the handshake advertises no cipher.
    #[error("key material present but handshake advertises no encryption")]
    EncryptionNotAdvertised,

    /// A conclusion handshake flags an extension group it does not carry.
    #[error("handshake sets {flag} but carries no matching extension")]
    MissingExtension { flag: &'static str },

    /// An extension block failed to decode while validating.
    #[error("extension {ext_type} is malformed")]
    MalformedExtension { ext_type: u16 },
}

/// Checks key material against the handshake encryption field.
pub fn check_key_material(
    encryption: EncryptionField,
    km: &KeyMaterial,
) -> Result<(), ValidationError> {
    let expected = encryption
        .key_bytes()
        .ok_or(ValidationError::EncryptionNotAdvertised)?;
    let actual = km.key_words() * 4;
    if actual != expected {
        return Err(ValidationError::KeyLengthMismatch { expected, actual });
    }
    Ok(())
}

/// Checks that a conclusion handshake carries the extensions its flags name.
///
/// Other handshake types reuse the extension field for other purposes and
/// always pass.
pub fn check_extension_flags(hs: &Handshake) -> Result<(), ValidationError> {
    if hs.handshake_type != HandshakeType::Conclusion {
        return Ok(());
    }

    let groups: [(u16, &'static str, &[ExtensionType]); 3] = [
        (
            ExtensionFlags::HSREQ,
            "HSREQ",
            &[ExtensionType::HsReq, ExtensionType::HsRsp],
        ),
        (
            ExtensionFlags::KMREQ,
            "KMREQ",
            &[ExtensionType::KmReq, ExtensionType::KmRsp],
        ),
        (
            ExtensionFlags::CONFIG,
            "CONFIG",
            &[
                ExtensionType::StreamId,
                ExtensionType::Congestion,
                ExtensionType::Filter,
                ExtensionType::Group,
            ],
        ),
    ];

    for (flag, name, types) in groups {
        if !hs.extension_flags.contains(flag) {
            continue;
        }
        let present = hs
            .extensions
            .iter()
            .any(|block| types.iter().any(|t| t.raw() == block.ext_type));
        if !present {
            return Err(ValidationError::MissingExtension { flag: name });
        }
    }
    Ok(())
}

/// Runs every handshake-level check: extension flags, then each carried
/// key material envelope against the encryption field.
pub fn validate_handshake(hs: &Handshake, limits: &CodecLimits) -> Result<(), ValidationError> {
    check_extension_flags(hs)?;
    for block in &hs.extensions {
        let ext = Extension::from_block(block, limits).map_err(|_| {
            ValidationError::MalformedExtension {
                ext_type: block.ext_type,
            }
        })?;
        if let Some(km) = ext.key_material() {
            check_key_material(hs.encryption, km)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionBlock;
    use crate::keymat::{KeyFlags, KmPacketType, CIPHER_AES_CTR};

    fn km(key_len: usize) -> KeyMaterial {
        KeyMaterial {
            version: 1,
            packet_type: KmPacketType::KeyingMaterial,
            key_flags: KeyFlags::Even,
            keki: 0,
            cipher: CIPHER_AES_CTR,
            auth: 0,
            stream_encapsulation: 2,
            salt: vec![0; 16],
            wrap: vec![0; 8 + key_len],
        }
    }

    fn conclusion(flags: u16, extensions: Vec<ExtensionBlock>) -> Handshake {
        Handshake {
            version: 5,
            encryption: EncryptionField::Aes128,
            extension_flags: ExtensionFlags::from_raw(flags),
            initial_seq: 0,
            mtu: 1500,
            flow_window: 8192,
            handshake_type: HandshakeType::Conclusion,
            socket_id: 1,
            syn_cookie: 2,
            peer_ip: [0; 4],
            extensions,
        }
    }

    #[test]
    fn key_length_matches() {
        assert!(check_key_material(EncryptionField::Aes128, &km(16)).is_ok());
        assert!(check_key_material(EncryptionField::Aes256, &km(32)).is_ok());
    }

    #[test]
    fn key_length_mismatch() {
        assert_eq!(
            check_key_material(EncryptionField::Aes256, &km(16)).unwrap_err(),
            ValidationError::KeyLengthMismatch {
                expected: 32,
                actual: 16,
            }
        );
    }

    #[test]
    fn no_encryption_advertised() {
        assert_eq!(
            check_key_material(EncryptionField::None, &km(16)).unwrap_err(),
            ValidationError::EncryptionNotAdvertised
        );
    }

    #[test]
    fn missing_kmreq() {
        let hs = conclusion(
            ExtensionFlags::HSREQ | ExtensionFlags::KMREQ,
            vec![ExtensionBlock::new(1, vec![0; 12]).unwrap()],
        );
        assert_eq!(
            check_extension_flags(&hs).unwrap_err(),
            ValidationError::MissingExtension { flag: "KMREQ" }
        );
    }

    #[test]
    fn induction_is_not_checked() {
        let mut hs = conclusion(ExtensionFlags::SRT_MAGIC, Vec::new());
        hs.handshake_type = HandshakeType::Induction;
        assert!(check_extension_flags(&hs).is_ok());
    }

    #[test]
    fn full_handshake_validation() {
        let kmreq = Extension::KmReq(km(16)).to_block().unwrap();
        let hs = conclusion(ExtensionFlags::KMREQ, vec![kmreq]);
        assert!(validate_handshake(&hs, &CodecLimits::default()).is_ok());

        let kmreq = Extension::KmReq(km(24)).to_block().unwrap();
        let hs = conclusion(ExtensionFlags::KMREQ, vec![kmreq]);
        assert_eq!(
            validate_handshake(&hs, &CodecLimits::default()).unwrap_err(),
            ValidationError::KeyLengthMismatch {
                expected: 16,
                actual: 24,
            }
        );
    }

    #[test]
    fn malformed_block_reported() {
        let hs = conclusion(
            ExtensionFlags::HSREQ,
            vec![ExtensionBlock::new(1, vec![0; 4]).unwrap()],
        );
        assert_eq!(
            validate_handshake(&hs, &CodecLimits::default()).unwrap_err(),
            ValidationError::MalformedExtension { ext_type: 1 }
        );
    }
}
