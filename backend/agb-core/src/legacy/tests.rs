use super::*;
use crate::memory::Region;
use test_log::test;

#[test]
fn register_offsets() {
    assert_eq!(reg_addr(offsets::DISPCNT), 0x0400_0000);
    assert_eq!(reg_addr(offsets::BLDY), 0x0400_0054);
    assert_eq!(offsets::bgcnt(3), offsets::BG3CNT);
    assert_eq!(offsets::bghofs(2), offsets::BG2HOFS);
    assert_eq!(offsets::bgvofs(1), offsets::BG1VOFS);
    assert_eq!(OBJ_PLTT, 0x0500_0200);
}

#[test]
fn or_into_registers() {
    let mut hardware = Hardware::new();
    let mut io = hardware.io();

    io.write16(offsets::DISPCNT, 0x0100);
    io.set_bits16(offsets::DISPCNT, 0x1000 | 0x0400);
    io.clear_bits16(offsets::DISPCNT, 0x0100);
    assert_eq!(io.read16(offsets::DISPCNT), 0x1400);

    io.modify16(offsets::BG1CNT, |value| value | (4 << 8));
    assert_eq!(io.read16(offsets::BG1CNT), 0x0400);

    assert_eq!(hardware.registers.bg_control(1).screen_base, 8 * 1024);
}

#[test]
fn reference_point_store() {
    let mut hardware = Hardware::new();
    let mut io = hardware.io();

    io.write32(offsets::BG2X, 0x0FFF_FF00);
    io.write32(offsets::BG3Y, 120 << 8);

    let bg2 = hardware.registers.bg_affine_parameters(2).unwrap();
    assert_eq!(bg2.reference_x, -256);
    assert_eq!(hardware.registers.bg_affine_parameters(3).unwrap().reference_y, 120 << 8);
}

#[test]
fn byte_writes() {
    let mut hardware = Hardware::new();
    let mut io = hardware.io();

    io.write8(offsets::WININ, 0x13);
    io.write8(offsets::WININ + 1, 0x3F);
    assert_eq!(io.read16(offsets::WININ), 0x3F13);
}

#[test]
fn unmapped_offsets() {
    let mut hardware = Hardware::new();
    let mut io = hardware.io();

    io.write16(0x200, 0xFFFF);
    assert_eq!(io.read16(0x200), 0);
    assert_eq!(io.read16(offsets::VCOUNT), 0);
}

#[test]
fn palette_and_dma_helpers() {
    let mut hardware = Hardware::new();
    let mut io = hardware.io();

    io.set_bg_color(255, 0x7FFF);
    io.set_obj_color(1, 0x7C1F);
    io.dma3_fill(0x1111, VRAM + 0x8000, 16);
    io.dma3_copy(&[1, 2, 3, 4], OAM, 2);

    let memory = &hardware.memory;
    assert_eq!(memory.read_u16(Region::BgPalette, 510), 0x7FFF);
    assert_eq!(memory.read_u16(Region::ObjPalette, 2), 0x7C1F);
    assert_eq!(&memory.vram()[0x8000..0x8020], &[0x11; 32]);
    assert_eq!(&memory.oam()[0..4], &[1, 2, 3, 4]);
}

#[test]
#[should_panic(expected = "Invalid bus access")]
fn bg_palette_index_past_bus_range_panics() {
    // Entries 256+ are OBJ palette on the bus, and 512+ are past the palette range entirely
    let mut hardware = Hardware::new();
    hardware.io().set_bg_color(512, 0);
}
