#[cfg(test)]
mod tests {
    use crate::error::{DotError, OpcodePage};
    use crate::frontend::settings::Settings;
    use crate::frontend::{Frontend, PumpStatus};
    use crate::gameboy::GameBoy;
    use crate::lr35902::registers::{Flags, Reg16, Reg8};
    use crate::memory::cartridge::Cartridge;
    use crate::video::palette::Palette;
    use crate::video::Framebuffer;

    fn cart_image(program: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; 0x8000];
        data[0x100..0x100 + program.len()].copy_from_slice(program);
        data
    }

    fn boot(program: &[u8]) -> GameBoy {
        GameBoy::new(None, Cartridge::new(cart_image(program)), Settings::default())
    }

    fn step(gb: &mut GameBoy) {
        gb.cpu.step(&mut gb.mmu).expect("instruction failed");
    }

    mod registers {
        use super::*;

        #[test]
        fn write8_preserves_the_sibling_register() {
            let mut gb = boot(&[]);

            gb.cpu.write_register16(Reg16::BC, 0x1234);
            gb.cpu.write_register(Reg8::B, 0xaa);

            assert_eq!(gb.cpu.read_register(Reg8::B), 0xaa);
            assert_eq!(gb.cpu.read_register(Reg8::C), 0x34);
            assert_eq!(gb.cpu.read_register16(Reg16::BC), 0xaa34);

            gb.cpu.write_register(Reg8::C, 0x55);
            assert_eq!(gb.cpu.read_register(Reg8::B), 0xaa);
            assert_eq!(gb.cpu.read_register16(Reg16::BC), 0xaa55);
        }

        #[test]
        fn accumulator_is_the_high_byte_of_af() {
            let mut gb = boot(&[]);

            gb.cpu.write_register(Reg8::A, 0x9c);
            assert_eq!(gb.cpu.read_register16(Reg16::AF), 0x9c00);
        }

        #[test]
        fn af_low_nibble_is_always_zero() {
            let mut gb = boot(&[]);

            gb.cpu.write_register16(Reg16::AF, 0xffff);
            assert_eq!(gb.cpu.read_register16(Reg16::AF), 0xfff0);
        }

        #[test]
        fn carry_condition_reads_bit_4() {
            let mut gb = boot(&[]);

            gb.cpu.update_flag(Flags::CARRY, true);
            assert_eq!(gb.cpu.read_register16(Reg16::AF) & 0x00ff, 0x0010);
            assert!(gb.cpu.read_flag(Flags::CARRY));

            gb.cpu.update_flag(Flags::CARRY, false);
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }
    }

    mod fetch_and_stack {
        use super::*;

        #[test]
        fn fetch_byte_advances_pc_by_one() {
            let mut gb = boot(&[0xab]);

            let value = gb.cpu.fetch_byte(&gb.mmu);
            assert_eq!(value, 0xab);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x101);
        }

        #[test]
        fn fetch_word_is_little_endian_and_advances_pc_by_two() {
            let mut gb = boot(&[0x34, 0x12]);

            let value = gb.cpu.fetch_word(&gb.mmu);
            assert_eq!(value, 0x1234);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x102);
        }

        #[test]
        fn push_stores_little_endian_at_the_new_sp() {
            let mut gb = boot(&[]);

            gb.cpu.push_stack(&mut gb.mmu, 0x0103);
            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0xfffc);
            assert_eq!(gb.mmu.read(0xfffc), 0x03);
            assert_eq!(gb.mmu.read(0xfffd), 0x01);
        }

        #[test]
        fn pop_mirrors_push_and_restores_sp() {
            let mut gb = boot(&[]);

            gb.cpu.push_stack(&mut gb.mmu, 0xbeef);
            let value = gb.cpu.pop_stack(&gb.mmu);

            assert_eq!(value, 0xbeef);
            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0xfffe);
        }
    }

    mod mmu {
        use super::*;
        use crate::memory::registers::InterruptFlags;

        #[test]
        fn bootrom_shadows_the_cartridge_until_locked() {
            let mut image = cart_image(&[]);
            image[0x0000] = 0x5a;
            let mut gb = GameBoy::new(Some(vec![0xaa; 0x100]), Cartridge::new(image), Settings::default());

            assert_eq!(gb.mmu.read(0x0000), 0xaa);
            assert_eq!(gb.mmu.read(0x00ff), 0xaa);

            gb.mmu.write(0xff50, 0x01);
            assert_eq!(gb.mmu.read(0x0000), 0x5a);

            // the lock is one-way
            gb.mmu.write(0xff50, 0x00);
            assert_eq!(gb.mmu.read(0x0000), 0x5a);
        }

        #[test]
        fn reads_above_the_bootrom_ignore_the_overlay() {
            let gb = GameBoy::new(Some(vec![0xaa; 0x100]), Cartridge::new(cart_image(&[0x42])), Settings::default());

            assert_eq!(gb.mmu.read(0x0100), 0x42);
        }

        #[test]
        fn switched_slot_reads_through_the_bank_latch() {
            let mut image = vec![0u8; 0x10000];
            image[0x4000] = 0x11;
            image[0x8000] = 0x22;
            let mut gb = GameBoy::new(None, Cartridge::new(image), Settings::default());

            // default bank is 1
            assert_eq!(gb.mmu.read(0x4000), 0x11);

            gb.mmu.select_rom_bank(2);
            assert_eq!(gb.mmu.read(0x4000), 0x22);

            // bank 0 aliases to 1
            gb.mmu.select_rom_bank(0);
            assert_eq!(gb.mmu.read(0x4000), 0x11);
        }

        #[test]
        fn ly_writes_reset_the_counter() {
            let mut gb = boot(&[]);

            gb.mmu.write_unchecked(0xff44, 0x7f);
            gb.mmu.write(0xff44, 0x55);

            assert_eq!(gb.mmu.read(0xff44), 0x00);
        }

        #[test]
        fn rom_only_writes_are_dropped() {
            let mut gb = boot(&[]);
            let before = gb.mmu.read(0x2000);

            gb.mmu.write(0x2000, 0x1f);

            assert_eq!(gb.mmu.read(0x2000), before);
            assert_eq!(gb.mmu.read(0x4000), 0x00);
        }

        #[test]
        fn effective_ram_round_trips() {
            let mut gb = boot(&[]);

            gb.mmu.write(0xc000, 0x77);
            gb.mmu.write16(0xff80, 0xbeef);

            assert_eq!(gb.mmu.read(0xc000), 0x77);
            assert_eq!(gb.mmu.read16(0xff80), 0xbeef);
        }

        #[test]
        fn request_interrupt_sets_the_flag_bit() {
            let mut gb = boot(&[]);

            gb.mmu.request_interrupt(InterruptFlags::TIMER);

            assert_eq!(gb.mmu.read(0xff0f), 0b00100);
        }
    }

    mod instructions {
        use super::*;

        #[test]
        fn nop_sequence_only_advances_pc() {
            let mut gb = boot(&[0x00; 10]);

            for _ in 0..10 {
                step(&mut gb);
            }

            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x10a);
            assert_eq!(gb.cpu.read_register16(Reg16::BC), 0x0013);
            assert_eq!(gb.cpu.read_register16(Reg16::DE), 0x00d8);
            assert_eq!(gb.cpu.read_register16(Reg16::HL), 0x014d);
            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0xfffe);
            assert_eq!(gb.cpu.read_register16(Reg16::AF), 0x0000);
        }

        #[test]
        fn ld_then_xor_clears_the_accumulator() {
            let mut gb = boot(&[0x3e, 0x2a, 0xaf]);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x2a);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x00);
            assert!(gb.cpu.read_flag(Flags::ZERO));
            assert!(!gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(!gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x103);
        }

        #[test]
        fn call_pushes_the_return_address_and_ret_pops_it() {
            let mut image = cart_image(&[0xcd, 0x10, 0x00]);
            image[0x0010] = 0xc9;
            let mut gb = GameBoy::new(None, Cartridge::new(image), Settings::default());

            step(&mut gb);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0010);
            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0xfffc);
            assert_eq!(gb.mmu.read(0xfffc), 0x03);
            assert_eq!(gb.mmu.read(0xfffd), 0x01);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0103);
            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0xfffe);
        }

        #[test]
        fn jr_minus_two_loops_in_place() {
            let mut gb = boot(&[0x18, 0xfe]);

            step(&mut gb);
            let first = gb.cpu.read_register16(Reg16::PC);
            step(&mut gb);
            let second = gb.cpu.read_register16(Reg16::PC);

            assert_eq!(first, 0x100);
            assert_eq!(first, second);
        }

        #[test]
        fn bit_test_reports_into_zero_flag() {
            let mut gb = boot(&[0xcb, 0x77, 0xcb, 0x7f]);
            gb.cpu.write_register(Reg8::A, 0b0100_0000);

            // bit 6, a: set
            step(&mut gb);
            assert!(!gb.cpu.read_flag(Flags::ZERO));
            assert!(!gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert_eq!(gb.cpu.read_register(Reg8::A), 0b0100_0000);

            // bit 7, a: clear
            step(&mut gb);
            assert!(gb.cpu.read_flag(Flags::ZERO));
        }

        #[test]
        fn add_reports_half_carry_out_of_bit_3() {
            let mut gb = boot(&[0xc6, 0x01]);
            gb.cpu.write_register(Reg8::A, 0x0f);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x10);
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
            assert!(!gb.cpu.read_flag(Flags::ZERO));
            assert!(!gb.cpu.read_flag(Flags::SUBTRACT));
        }

        #[test]
        fn add_wraps_and_sets_carry() {
            let mut gb = boot(&[0xc6, 0x02]);
            gb.cpu.write_register(Reg8::A, 0xff);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x01);
            assert!(gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn adc_adds_the_carry_in() {
            let mut gb = boot(&[0xce, 0x01]);
            gb.cpu.write_register(Reg8::A, 0x01);
            gb.cpu.update_flag(Flags::CARRY, true);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x03);
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn sub_to_zero_sets_zero_and_subtract() {
            let mut gb = boot(&[0xd6, 0x2a]);
            gb.cpu.write_register(Reg8::A, 0x2a);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x00);
            assert!(gb.cpu.read_flag(Flags::ZERO));
            assert!(gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(!gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn sbc_subtracts_the_carry_in() {
            let mut gb = boot(&[0xde, 0x02]);
            gb.cpu.write_register(Reg8::A, 0x05);
            gb.cpu.update_flag(Flags::CARRY, true);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x02);
            assert!(gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn compare_discards_the_result() {
            let mut gb = boot(&[0xfe, 0x20]);
            gb.cpu.write_register(Reg8::A, 0x10);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x10);
            assert!(gb.cpu.read_flag(Flags::CARRY));
            assert!(gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(!gb.cpu.read_flag(Flags::ZERO));
        }

        #[test]
        fn and_sets_half_carry_only() {
            let mut gb = boot(&[0xe6, 0x0f]);
            gb.cpu.write_register(Reg8::A, 0xf0);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x00);
            assert!(gb.cpu.read_flag(Flags::ZERO));
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn inc_preserves_carry() {
            let mut gb = boot(&[0x3c]);
            gb.cpu.write_register(Reg8::A, 0xff);
            gb.cpu.update_flag(Flags::CARRY, true);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x00);
            assert!(gb.cpu.read_flag(Flags::ZERO));
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn dec_reports_half_borrow() {
            let mut gb = boot(&[0x3d]);
            gb.cpu.write_register(Reg8::A, 0x10);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x0f);
            assert!(gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
        }

        #[test]
        fn daa_adjusts_a_bcd_sum() {
            let mut gb = boot(&[0x3e, 0x15, 0xc6, 0x27, 0x27]);

            step(&mut gb);
            step(&mut gb);
            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x42);
            assert!(!gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn cpl_inverts_the_accumulator() {
            let mut gb = boot(&[0x2f]);
            gb.cpu.write_register(Reg8::A, 0b1010_0101);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0b0101_1010);
            assert!(gb.cpu.read_flag(Flags::SUBTRACT));
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
        }

        #[test]
        fn scf_sets_and_ccf_toggles_carry() {
            let mut gb = boot(&[0x37, 0x3f, 0x3f]);

            step(&mut gb);
            assert!(gb.cpu.read_flag(Flags::CARRY));

            step(&mut gb);
            assert!(!gb.cpu.read_flag(Flags::CARRY));

            step(&mut gb);
            assert!(gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn add_hl_preserves_zero_and_carries_from_bit_11() {
            let mut gb = boot(&[0x09]);
            gb.cpu.write_register16(Reg16::HL, 0x0fff);
            gb.cpu.write_register16(Reg16::BC, 0x0001);
            gb.cpu.update_flag(Flags::ZERO, true);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::HL), 0x1000);
            assert!(gb.cpu.read_flag(Flags::ZERO));
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(!gb.cpu.read_flag(Flags::CARRY));
            assert!(!gb.cpu.read_flag(Flags::SUBTRACT));
        }

        #[test]
        fn add_sp_carries_from_the_low_byte() {
            let mut gb = boot(&[0xe8, 0x08]);
            gb.cpu.write_register16(Reg16::SP, 0xfff8);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0x0000);
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(gb.cpu.read_flag(Flags::CARRY));
            assert!(!gb.cpu.read_flag(Flags::ZERO));
        }

        #[test]
        fn ld_hl_sp_offset_flags_match_add_sp() {
            let mut gb = boot(&[0xf8, 0x02]);
            gb.cpu.write_register16(Reg16::SP, 0xfffe);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::HL), 0x0000);
            assert_eq!(gb.cpu.read_register16(Reg16::SP), 0xfffe);
            assert!(gb.cpu.read_flag(Flags::HALF_CARRY));
            assert!(gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn rla_rotates_through_carry_and_writes_back() {
            let mut gb = boot(&[0x17, 0x17]);
            gb.cpu.write_register(Reg8::A, 0x80);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x00);
            assert!(gb.cpu.read_flag(Flags::CARRY));
            assert!(!gb.cpu.read_flag(Flags::ZERO));

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x01);
            assert!(!gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn rlca_copies_bit_7_into_bit_0() {
            let mut gb = boot(&[0x07]);
            gb.cpu.write_register(Reg8::A, 0x81);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x03);
            assert!(gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn swap_exchanges_nibbles() {
            let mut gb = boot(&[0xcb, 0x37]);
            gb.cpu.write_register(Reg8::A, 0xab);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0xba);
            assert!(!gb.cpu.read_flag(Flags::CARRY));
            assert!(!gb.cpu.read_flag(Flags::ZERO));
        }

        #[test]
        fn srl_shifts_into_carry() {
            let mut gb = boot(&[0xcb, 0x3f]);
            gb.cpu.write_register(Reg8::A, 0x01);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::A), 0x00);
            assert!(gb.cpu.read_flag(Flags::ZERO));
            assert!(gb.cpu.read_flag(Flags::CARRY));
        }

        #[test]
        fn res_and_set_touch_one_bit() {
            let mut gb = boot(&[0xcb, 0x87, 0xcb, 0xc7]);
            gb.cpu.write_register(Reg8::A, 0xff);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0xfe);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0xff);
        }

        #[test]
        fn ld_between_registers() {
            let mut gb = boot(&[0x41]);
            gb.cpu.write_register(Reg8::C, 0x12);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register(Reg8::B), 0x12);
        }

        #[test]
        fn ld_through_hl_reads_and_writes_memory() {
            let mut gb = boot(&[0x36, 0x99, 0x7e]);
            gb.cpu.write_register16(Reg16::HL, 0xc000);

            step(&mut gb);
            assert_eq!(gb.mmu.read(0xc000), 0x99);

            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x99);
        }

        #[test]
        fn ldi_and_ldd_move_hl() {
            let mut gb = boot(&[0x22, 0x3a]);
            gb.cpu.write_register16(Reg16::HL, 0xc000);
            gb.cpu.write_register(Reg8::A, 0x11);

            step(&mut gb);
            assert_eq!(gb.mmu.read(0xc000), 0x11);
            assert_eq!(gb.cpu.read_register16(Reg16::HL), 0xc001);

            gb.mmu.write(0xc001, 0x7c);
            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x7c);
            assert_eq!(gb.cpu.read_register16(Reg16::HL), 0xc000);
        }

        #[test]
        fn ldh_addresses_the_high_page() {
            let mut gb = boot(&[0x3e, 0x55, 0xe0, 0x80, 0x3e, 0x00, 0xf0, 0x80]);

            step(&mut gb);
            step(&mut gb);
            assert_eq!(gb.mmu.read(0xff80), 0x55);

            step(&mut gb);
            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x55);
        }

        #[test]
        fn ld_a_to_and_from_absolute_addresses() {
            let mut gb = boot(&[0xea, 0x00, 0xc0, 0x3e, 0x00, 0xfa, 0x00, 0xc0]);
            gb.cpu.write_register(Reg8::A, 0x66);

            step(&mut gb);
            assert_eq!(gb.mmu.read(0xc000), 0x66);

            step(&mut gb);
            step(&mut gb);
            assert_eq!(gb.cpu.read_register(Reg8::A), 0x66);
        }

        #[test]
        fn ld_nn_sp_stores_the_whole_word() {
            let mut gb = boot(&[0x08, 0x00, 0xc0]);
            gb.cpu.write_register16(Reg16::SP, 0xabcd);

            step(&mut gb);

            assert_eq!(gb.mmu.read(0xc000), 0xcd);
            assert_eq!(gb.mmu.read(0xc001), 0xab);
        }

        #[test]
        fn conditional_jumps_follow_the_zero_flag() {
            let mut gb = boot(&[0xaf, 0xca, 0x50, 0x01]);

            step(&mut gb);
            step(&mut gb);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0150);

            let mut gb = boot(&[0xaf, 0xc2, 0x50, 0x01]);
            step(&mut gb);
            step(&mut gb);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0104);
        }

        #[test]
        fn jp_hl_jumps_to_the_register() {
            let mut gb = boot(&[0xe9]);
            gb.cpu.write_register16(Reg16::HL, 0x1234);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x1234);
        }

        #[test]
        fn rst_pushes_and_jumps_to_its_vector() {
            let mut gb = boot(&[0xef]);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0028);
            assert_eq!(gb.mmu.read16(0xfffc), 0x0101);
        }

        #[test]
        fn push_pop_round_trips_af_with_a_clean_nibble() {
            let mut gb = boot(&[0xf5, 0xc1]);
            gb.cpu.write_register(Reg8::A, 0x12);
            gb.cpu.update_flag(Flags::ZERO, true);

            // push af, pop bc
            step(&mut gb);
            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::BC), 0x1280);
        }

        #[test]
        fn halt_stops_the_cpu() {
            let mut gb = boot(&[0x76]);

            step(&mut gb);

            assert!(gb.cpu.is_halted());
        }

        #[test]
        fn stop_consumes_its_padding_byte() {
            let mut gb = boot(&[0x10, 0x00]);

            step(&mut gb);

            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0102);
        }

        #[test]
        fn di_and_ei_toggle_the_master_enable() {
            let mut gb = boot(&[0xfb, 0xf3]);

            step(&mut gb);
            assert!(gb.cpu.interrupts_enabled());

            step(&mut gb);
            assert!(!gb.cpu.interrupts_enabled());
        }

        #[test]
        fn unknown_opcode_reports_its_location() {
            let mut gb = boot(&[0xd3]);

            let err = gb.cpu.step(&mut gb.mmu).unwrap_err();
            match err {
                DotError::UnknownOpcode { page, opcode, pc } => {
                    assert_eq!(page, OpcodePage::Unprefixed);
                    assert_eq!(opcode, 0xd3);
                    assert_eq!(pc, 0x0100);
                }
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    mod interrupts {
        use super::*;

        #[test]
        fn vblank_wins_the_priority_scan() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xffff, 0x1f);
            gb.mmu.write(0xff0f, 0b00101);
            gb.cpu.enable_interrupts();

            let vector = gb.cpu.dispatch_interrupts(&mut gb.mmu);

            assert!(vector.is_some());
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0040);
            // vblank acknowledged, timer still pending
            assert_eq!(gb.mmu.read(0xff0f), 0b00100);
        }

        #[test]
        fn dispatch_pushes_pc_and_drops_ime() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xffff, 0x01);
            gb.mmu.write(0xff0f, 0x01);
            gb.cpu.enable_interrupts();

            gb.cpu.dispatch_interrupts(&mut gb.mmu);

            assert_eq!(gb.mmu.read16(0xfffc), 0x0100);
            assert!(!gb.cpu.interrupts_enabled());
        }

        #[test]
        fn dispatch_requires_ime() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xffff, 0x01);
            gb.mmu.write(0xff0f, 0x01);

            assert!(gb.cpu.dispatch_interrupts(&mut gb.mmu).is_none());
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0100);
        }

        #[test]
        fn dispatch_requires_the_enable_mask() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xff0f, 0x01);
            gb.cpu.enable_interrupts();

            assert!(gb.cpu.dispatch_interrupts(&mut gb.mmu).is_none());
        }

        #[test]
        fn dispatch_wakes_a_halted_cpu() {
            let mut image = cart_image(&[0x76]);
            image[0x0040] = 0xd9;
            let mut gb = GameBoy::new(None, Cartridge::new(image), Settings::default());

            step(&mut gb);
            assert!(gb.cpu.is_halted());

            gb.mmu.write(0xffff, 0x01);
            gb.mmu.write(0xff0f, 0x01);
            gb.cpu.enable_interrupts();
            gb.cpu.dispatch_interrupts(&mut gb.mmu);

            assert!(!gb.cpu.is_halted());
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0040);

            // reti returns to the halt's successor and restores ime
            step(&mut gb);
            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0101);
            assert!(gb.cpu.interrupts_enabled());
        }
    }

    mod video {
        use super::*;

        #[test]
        fn ly_advances_and_requests_vblank_at_144() {
            let mut gb = boot(&[]);
            gb.mmu.write_unchecked(0xff44, 143);

            gb.ppu.advance_scanline(&mut gb.mmu);

            assert_eq!(gb.mmu.read(0xff44), 144);
            assert_eq!(gb.mmu.read(0xff0f) & 0x01, 0x01);
        }

        #[test]
        fn ly_wraps_past_153_without_a_request() {
            let mut gb = boot(&[]);
            gb.mmu.write_unchecked(0xff44, 153);
            gb.mmu.write(0xff0f, 0x00);

            gb.ppu.advance_scanline(&mut gb.mmu);

            assert_eq!(gb.mmu.read(0xff44), 0);
            assert_eq!(gb.mmu.read(0xff0f) & 0x01, 0x00);
        }

        #[test]
        fn vblank_request_feeds_the_dispatcher() {
            let mut gb = boot(&[]);
            gb.mmu.write_unchecked(0xff44, 143);
            gb.mmu.write(0xffff, 0x01);
            gb.cpu.enable_interrupts();

            gb.ppu.advance_scanline(&mut gb.mmu);
            gb.cpu.dispatch_interrupts(&mut gb.mmu);

            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0040);
            assert_eq!(gb.mmu.read(0xff0f) & 0x01, 0x00);
            assert!(!gb.cpu.interrupts_enabled());
        }

        #[test]
        fn bgp_selects_the_four_shades() {
            let palette = Palette::from_bgp(0b1110_0100);

            assert_eq!(palette.color(0), 0xffff_ffff);
            assert_eq!(palette.color(1), 0x7e7e_7eff);
            assert_eq!(palette.color(2), 0x3f3f_3fff);
            assert_eq!(palette.color(3), 0x0000_00ff);
        }

        #[test]
        fn renders_an_unsigned_tile_as_scaled_blocks() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xff40, 0x10);
            gb.mmu.write(0xff47, 0b1110_0100);

            // tile 1, top row all colour index 1
            gb.mmu.write(0x9800, 0x01);
            gb.mmu.write(0x8010, 0xff);
            gb.mmu.write(0x8011, 0x00);

            let mut frame = Framebuffer::new();
            gb.ppu.render(&gb.mmu, &mut frame);

            // a dmg pixel becomes a 4x4 block
            assert_eq!(frame.pixel(0, 0), 0x7e7e_7eff);
            assert_eq!(frame.pixel(3, 3), 0x7e7e_7eff);
            assert_eq!(frame.pixel(31, 3), 0x7e7e_7eff);
            // second tile row is colour 0
            assert_eq!(frame.pixel(0, 4), 0xffff_ffff);
        }

        #[test]
        fn signed_indexing_pivots_around_0x9000() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xff40, 0x00);
            gb.mmu.write(0xff47, 0b1110_0100);

            // index 0x80 = -128 lands at 0x8800; top row colour index 2
            gb.mmu.write(0x9800, 0x80);
            gb.mmu.write(0x8800, 0x00);
            gb.mmu.write(0x8801, 0xff);

            let mut frame = Framebuffer::new();
            gb.ppu.render(&gb.mmu, &mut frame);

            assert_eq!(frame.pixel(0, 0), 0x3f3f_3fff);
        }

        #[test]
        fn lcdc_bit_3_selects_the_second_tilemap() {
            let mut gb = boot(&[]);
            gb.mmu.write(0xff40, 0x18);
            gb.mmu.write(0xff47, 0b1110_0100);

            gb.mmu.write(0x9c00, 0x02);
            gb.mmu.write(0x8020, 0xff);
            gb.mmu.write(0x8021, 0xff);

            let mut frame = Framebuffer::new();
            gb.ppu.render(&gb.mmu, &mut frame);

            assert_eq!(frame.pixel(0, 0), 0x0000_00ff);
        }
    }

    mod main_loop {
        use super::*;

        struct TestFrontend {
            polls_left: usize,
            frames: usize,
        }

        impl Frontend for TestFrontend {
            fn poll_events(&mut self) -> PumpStatus {
                if self.polls_left == 0 {
                    PumpStatus::Shutdown
                } else {
                    self.polls_left -= 1;
                    PumpStatus::Continue
                }
            }

            fn present(&mut self, _frame: &Framebuffer) -> Result<(), DotError> {
                self.frames += 1;
                Ok(())
            }
        }

        #[test]
        fn run_executes_until_shutdown() {
            // a zero-filled image is a sea of nops
            let mut gb = GameBoy::new(None, Cartridge::new(cart_image(&[])), Settings { uncapped: true });
            let mut frontend = TestFrontend { polls_left: 5, frames: 0 };

            gb.run(&mut frontend).expect("loop failed");

            assert_eq!(gb.cpu.read_register16(Reg16::PC), 0x0105);
            assert_eq!(gb.mmu.read(0xff44), 5);
            assert_eq!(frontend.frames, 1);
        }

        #[test]
        fn run_surfaces_decode_errors() {
            let mut gb = GameBoy::new(None, Cartridge::new(cart_image(&[0xd3])), Settings { uncapped: true });
            let mut frontend = TestFrontend { polls_left: 100, frames: 0 };

            let err = gb.run(&mut frontend).unwrap_err();
            assert!(matches!(err, DotError::UnknownOpcode { .. }));
        }
    }
}
