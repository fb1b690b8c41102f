use super::*;

const PRICES: &str = "Estrazione del 2024-03-15\n\
idImpianto;descCarburante;prezzo;isSelf;dtComu\n\
3464;Benzina;1.859;1;15/03/2024 07:01:05\n\
3464;Benzina;1.799;0;14/03/2024 19:12:00\n\
3464;Gasolio;1.759;1;15/03/2024 07:01:05\n\
3464;Blue Diesel;1.739;1;13/03/2024 08:00:00\n\
3464;Super Hydrogen;2.100;1;15/03/2024 07:01:05\n\
3465;GPL;0.719;1;12/03/2024 10:00:00\n\
3465;GPL;non disponibile;1;12/03/2024 10:00:00\n\
abc;GPL;0.700;1;12/03/2024 10:00:00\n";

const STATIONS: &str = "Estrazione del 2024-03-15\n\
idImpianto;Gestore;Bandiera;Tipo Impianto;Nome Impianto;Indirizzo;Comune;Provincia;Latitudine;Longitudine\n\
3464;ROSSI SRL;Agip Eni;Stradale;ENI ROMA NORD;VIA FLAMINIA 100;ROMA;RM;41.9300;12.4700\n\
3465;BIANCHI SAS;Q8;Autostradale;Q8 FIRENZE;A1 KM 280;FIRENZE;FI;43.7696;11.2558\n\
3466;VERDI;IP;Stradale;IP;VIA;TORINO;TO;45.07;7.68;extra\n\
xyz;VERDI;IP;Stradale;IP;VIA;TORINO;TO;45.07;7.68\n";

#[test]
fn keeps_cheapest_price_per_main_category_with_its_date() {
    let parsed = parse_prices(PRICES, &CategoryCatalogue::builtin()).unwrap();
    let station = &parsed.table[&3464];

    let benzina = &station["Benzina"];
    assert_eq!(benzina.price, Decimal::from_str("1.799").unwrap());
    assert_eq!(benzina.updated_at, "14/03/2024 19:12:00");

    // "Blue Diesel" folds into Gasolio and is cheaper.
    let gasolio = &station["Gasolio"];
    assert_eq!(gasolio.price, Decimal::from_str("1.739").unwrap());
    assert_eq!(gasolio.updated_at, "13/03/2024 08:00:00");
}

#[test]
fn unknown_fuels_keep_their_own_name() {
    let parsed = parse_prices(PRICES, &CategoryCatalogue::builtin()).unwrap();
    assert!(parsed.table[&3464].contains_key("Super Hydrogen"));
}

#[test]
fn unparsable_price_rows_are_skipped_and_counted() {
    let parsed = parse_prices(PRICES, &CategoryCatalogue::builtin()).unwrap();
    assert_eq!(parsed.rows, 8);
    assert_eq!(parsed.skipped, 2);
    assert_eq!(parsed.table.len(), 2);
    assert_eq!(
        parsed.table[&3465]["GPL"].price,
        Decimal::from_str("0.719").unwrap()
    );
}

#[test]
fn equal_prices_keep_first_row() {
    let text = "banner\nidImpianto;descCarburante;prezzo;isSelf;dtComu\n\
1;GPL;0.719;1;01/03/2024 10:00:00\n\
1;GPL;0.719;0;02/03/2024 10:00:00\n";
    let parsed = parse_prices(text, &CategoryCatalogue::builtin()).unwrap();
    assert_eq!(parsed.table[&1]["GPL"].updated_at, "01/03/2024 10:00:00");
}

#[test]
fn decimal_comma_is_accepted() {
    let text = "banner\nidImpianto;descCarburante;prezzo;isSelf;dtComu\n1;Metano;1,399;1;\n";
    let parsed = parse_prices(text, &CategoryCatalogue::builtin()).unwrap();
    assert_eq!(
        parsed.table[&1]["Metano"].price,
        Decimal::from_str("1.399").unwrap()
    );
    assert_eq!(parsed.table[&1]["Metano"].updated_at, "");
}

#[test]
fn missing_price_column_fails() {
    let text = "banner\nidImpianto;descCarburante;isSelf\n1;GPL;1\n";
    let err = parse_prices(text, &CategoryCatalogue::builtin()).unwrap_err();
    assert!(matches!(
        err,
        IngestError::MissingColumn { ref column, .. } if column == "prezzo"
    ));
}

#[test]
fn station_rows_are_read_and_bad_rows_skipped() {
    let parsed = parse_stations(STATIONS).unwrap();
    assert_eq!(parsed.stations.len(), 2);
    assert_eq!(parsed.skipped, 2);

    let first = &parsed.stations[0];
    assert_eq!(first.id, 3464);
    assert_eq!(first.brand, "Agip Eni");
    assert_eq!(first.kind, "Stradale");
    assert_eq!(first.name, "ENI ROMA NORD");
    assert_eq!(first.latitude, "41.9300");
    assert_eq!(first.longitude, "12.4700");
}

#[test]
fn banner_only_file_has_no_rows() {
    assert!(matches!(
        parse_stations("Estrazione del 2024-03-15"),
        Err(IngestError::MissingColumn { .. })
    ));
}
