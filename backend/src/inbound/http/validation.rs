//! Request validation helpers shared by the HTTP handlers.
//!
//! Failures become `invalid_request` errors whose details name the offending
//! field and a stable code, e.g. `{"field": "phone", "code": "invalid_phone"}`.

use serde_json::json;

use crate::domain::{
    BookingId, BookingValidationError, Error, PhoneNumber, ServiceAddress, ServiceId,
};

/// Field name as it appears in the JSON request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) const fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) const BOOKING_ID: FieldName = FieldName::new("bookingId");
pub(crate) const SERVICE_ID: FieldName = FieldName::new("serviceId");

fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code,
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let name = field.as_str();
    Error::invalid_request(format!("{name} must be a valid UUID")).with_details(json!({
        "field": name,
        "value": value,
        "code": "invalid_uuid",
    }))
}

pub(crate) fn parse_booking_id(raw: &str, field: FieldName) -> Result<BookingId, Error> {
    BookingId::new(raw).map_err(|_| invalid_uuid_error(field, raw))
}

pub(crate) fn parse_service_id(raw: &str, field: FieldName) -> Result<ServiceId, Error> {
    ServiceId::new(raw).map_err(|_| invalid_uuid_error(field, raw))
}

/// Map address and phone validation failures onto request fields.
pub(crate) fn map_booking_validation_error(error: BookingValidationError) -> Error {
    let message = error.to_string();
    match error {
        BookingValidationError::EmptyHouseNumber => {
            field_error(FieldName::new("address.houseNumber"), "empty_house_number", message)
        }
        BookingValidationError::EmptyAddressLabel => {
            field_error(FieldName::new("address.label"), "empty_address_label", message)
        }
        BookingValidationError::InvalidPhone => {
            field_error(FieldName::new("phone"), "invalid_phone", message)
        }
        BookingValidationError::MissingProvider { .. } => Error::internal(message),
    }
}

pub(crate) fn parse_address(
    house_number: &str,
    landmark: Option<&str>,
    label: &str,
) -> Result<ServiceAddress, Error> {
    ServiceAddress::new(house_number, landmark, label).map_err(map_booking_validation_error)
}

pub(crate) fn parse_phone(raw: &str) -> Result<PhoneNumber, Error> {
    PhoneNumber::new(raw).map_err(map_booking_validation_error)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    #[case("", "Home", "address.houseNumber", "empty_house_number")]
    #[case("12B", "  ", "address.label", "empty_address_label")]
    fn address_errors_name_the_field(
        #[case] house: &str,
        #[case] label: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let err = parse_address(house, None, label).expect_err("invalid address");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], field);
        assert_eq!(details["code"], code);
    }

    #[rstest]
    fn phone_error_names_the_field() {
        let err = parse_phone("call me").expect_err("invalid phone");
        assert_eq!(err.details().expect("details")["field"], "phone");
    }

    #[rstest]
    fn malformed_booking_id_echoes_value() {
        let err = parse_booking_id("b-42", BOOKING_ID).expect_err("not a uuid");
        let details = err.details().expect("details");
        assert_eq!(details["field"], "bookingId");
        assert_eq!(details["value"], "b-42");
        assert_eq!(details["code"], "invalid_uuid");
    }
}
