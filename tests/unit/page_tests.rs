#[path = "../common/mod.rs"]
mod common;

use pgincr::page::{is_zero_page, Lsn, PageHeader, PageLsnParser, PostgresPageParser, PAGE_SIZE};
use pgincr::Error;

use common::{error_kind, make_page, SAMPLE_LSN};

#[test]
fn lsn_display_and_parse() {
    let lsn = Lsn(0x1_c6bd_4600);
    assert_eq!(lsn.to_string(), "1/C6BD4600");
    assert_eq!("1/C6BD4600".parse::<Lsn>().unwrap(), lsn);
    assert_eq!("0x1c6bd4600".parse::<Lsn>().unwrap(), lsn);
    assert_eq!("7629260288".parse::<Lsn>().unwrap(), lsn);
    assert_eq!(Lsn::from_parts(1, 0xc6bd_4600), lsn);
    assert!(Lsn(1) > Lsn::INVALID);
    assert!(!Lsn::INVALID.is_valid());
}

#[test]
fn lsn_parse_rejects_garbage() {
    for raw in ["", "zz", "1/", "1/2/3", "0xg"] {
        let err = raw.parse::<Lsn>().expect_err("must reject");
        assert!(
            matches!(error_kind(&err), Error::InvalidLsn(_)),
            "unexpected error for {raw:?}: {err:?}"
        );
    }
}

#[test]
fn parses_lsn_from_valid_page() {
    let page = make_page(SAMPLE_LSN, 3);
    let header = PageHeader::parse(&page).unwrap();
    assert!(header.validate().is_ok());
    assert_eq!(header.page_size(), PAGE_SIZE);
    assert_eq!(
        PostgresPageParser.parse_page_lsn(&page).unwrap(),
        Lsn(SAMPLE_LSN)
    );
}

#[test]
fn zero_page_has_invalid_lsn() {
    let page = vec![0u8; PAGE_SIZE];
    assert!(is_zero_page(&page));
    assert_eq!(
        PostgresPageParser.parse_page_lsn(&page).unwrap(),
        Lsn::INVALID
    );
}

#[test]
fn corrupt_pages_are_rejected() {
    let mut bad_bounds = make_page(SAMPLE_LSN, 1);
    bad_bounds[14..16].copy_from_slice(&10u16.to_le_bytes()); // upper < lower

    let mut bad_flags = make_page(SAMPLE_LSN, 1);
    bad_flags[10..12].copy_from_slice(&0x0100u16.to_le_bytes());

    let mut bad_size = make_page(SAMPLE_LSN, 1);
    bad_size[18..20].copy_from_slice(&(4096u16 | 4).to_le_bytes());

    let mut new_with_data = vec![0u8; PAGE_SIZE];
    new_with_data[100] = 1;

    let garbage = vec![0xAAu8; PAGE_SIZE];

    for page in [bad_bounds, bad_flags, bad_size, new_with_data, garbage] {
        let err = PostgresPageParser
            .parse_page_lsn(&page)
            .expect_err("page must be rejected");
        assert!(matches!(error_kind(&err), Error::InvalidPageHeader { .. }));
    }
}

#[test]
fn short_buffer_is_rejected() {
    let err = PageHeader::parse(&[0u8; 10]).expect_err("too short");
    assert!(matches!(error_kind(&err), Error::InvalidPageHeader { .. }));
}
